use crate::aggregate::AggregateTable;
use crate::combine::ComparativeMatrix;
use crate::mask::Mask;
use chrono::NaiveDateTime;
use configuration::AnalysisSettings;
use core_types::{Highlight, MaskPolicy, MetricMode};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Everything that determines a run besides the trades themselves.
///
/// `reference_time` is always supplied by the caller so that the same inputs
/// reproduce the same report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunParameters {
    pub metric: MetricMode,
    pub policy: MaskPolicy,
    pub reference_time: NaiveDateTime,
    pub recent_window_days: i64,
}

impl RunParameters {
    pub fn new(metric: MetricMode, policy: MaskPolicy, reference_time: NaiveDateTime) -> Self {
        Self {
            metric,
            policy,
            reference_time,
            recent_window_days: 90,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings, reference_time: NaiveDateTime) -> Self {
        Self {
            metric: settings.metric,
            policy: settings.policy,
            reference_time,
            recent_window_days: settings.recent_window_days,
        }
    }
}

/// Non-fatal conditions the caller may want to surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// No trade was opened on or after the recent-window cutoff.
    EmptyRecentWindow { cutoff: NaiveDateTime },
    /// The matrix had an odd number of columns; the last one was not paired.
    UnpairedTrailingColumn { column: String },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::EmptyRecentWindow { cutoff } => {
                write!(f, "No trades opened since {}; recent columns are empty", cutoff)
            }
            EngineWarning::UnpairedTrailingColumn { column } => {
                write!(
                    f,
                    "Column '{}' has no partner and was skipped for pair highlighting",
                    column
                )
            }
        }
    }
}

/// The full result of one engine run.
///
/// This is the data transfer object handed to whatever presents the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapReport {
    // I. Run context
    pub parameters: RunParameters,
    pub recent_cutoff: NaiveDateTime,
    pub total_records: usize,
    pub excluded_records: usize,
    pub recent_records: usize,

    // II. Window aggregates
    pub overall: AggregateTable,
    pub recent: AggregateTable,

    // III. Presentation layer inputs
    pub matrix: ComparativeMatrix,
    pub mask: Mask,
    pub global_threshold: Option<Decimal>, // Only set by the global policy

    pub warnings: Vec<EngineWarning>,
}

impl HeatmapReport {
    /// Number of cells carrying any highlight.
    pub fn highlighted_cells(&self) -> usize {
        self.mask.count(Highlight::AboveAverage) + self.mask.count(Highlight::AboveAverageBoth)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
