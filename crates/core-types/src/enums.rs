use crate::error::CoreError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the week a trade was opened on.
///
/// The declaration order is the display order: `Ord` sorts Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// The trading days that surface as matrix columns, in column order.
    pub const TRADING_DAYS: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    pub fn from_date(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    /// Full English weekday name, as used in column labels.
    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects the per-trade value that gets averaged into each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MetricMode {
    /// Raw profit/loss of the trade.
    #[default]
    Pl,
    /// P/L per unit of premium, rescaled by the largest premium in the batch.
    NormalizedPl,
    /// P/L per unit of premium, unscaled ("Normalized P/L %").
    Pcr,
}

impl MetricMode {
    pub fn label(&self) -> &'static str {
        match self {
            MetricMode::Pl => "P/L",
            MetricMode::NormalizedPl => "Normalized P/L",
            MetricMode::Pcr => "Normalized P/L % (PCR)",
        }
    }
}

impl FromStr for MetricMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pl" | "p/l" => Ok(MetricMode::Pl),
            "normalized-pl" | "normalized_pl" | "normalized p/l" => Ok(MetricMode::NormalizedPl),
            "pcr" | "normalized-pl-pct" | "normalized p/l %" => Ok(MetricMode::Pcr),
            other => Err(CoreError::InvalidInput("metric".to_string(), other.to_string())),
        }
    }
}

impl fmt::Display for MetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects how the highlight mask is derived from the comparative matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MaskPolicy {
    /// Each column is compared against its own mean. Binary highlighting.
    ColumnMean,
    /// Every cell is compared against the mean of all Overall cells, and
    /// paired Overall/Recent cells that both clear it are promoted.
    #[default]
    GlobalSynergy,
}

impl FromStr for MaskPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "column-mean" | "column_mean" | "per-column" => Ok(MaskPolicy::ColumnMean),
            "global-synergy" | "global_synergy" | "global" => Ok(MaskPolicy::GlobalSynergy),
            other => Err(CoreError::InvalidInput("policy".to_string(), other.to_string())),
        }
    }
}

impl MaskPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            MaskPolicy::ColumnMean => "column mean",
            MaskPolicy::GlobalSynergy => "global synergy",
        }
    }
}

impl fmt::Display for MaskPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which slice of the trade history an aggregate was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Window {
    Overall,
    Recent,
}

impl Window {
    pub fn name(&self) -> &'static str {
        match self {
            Window::Overall => "Overall",
            Window::Recent => "Recent",
        }
    }
}

/// Categorical highlight attached to a single matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    #[default]
    #[serde(rename = "none")]
    Unmarked,
    AboveAverage,
    AboveAverageBoth,
}

impl Highlight {
    pub fn is_marked(&self) -> bool {
        !matches!(self, Highlight::Unmarked)
    }
}
