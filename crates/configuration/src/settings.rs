use crate::error::ConfigError;
use core_types::{MaskPolicy, MetricMode};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent `tradeclock.toml` is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub ingest: IngestSettings,
    pub logging: LoggingSettings,
}

/// Parameters that shape a single engine run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// The per-trade metric averaged into each bucket.
    pub metric: MetricMode,
    /// The highlighting policy applied to the comparative matrix.
    pub policy: MaskPolicy,
    /// Span of the "recent" window, counted back from the reference time.
    pub recent_window_days: i64,
}

/// Rules applied while turning raw rows into typed trade records.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Rows whose `Legs` cell contains this substring are dropped.
    /// Matching is case-sensitive. An empty pattern disables the filter.
    pub excluded_legs_pattern: String,
    /// `chrono` format strings tried in order when parsing `Date Opened`.
    pub date_formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    /// When set, logs are also written to a daily-rotated file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            metric: MetricMode::Pl,
            policy: MaskPolicy::GlobalSynergy,
            recent_window_days: 90,
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            excluded_legs_pattern: "BTO".to_string(),
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%Y/%m/%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
            ],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Config {
    /// Rejects values that deserialize fine but cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.recent_window_days <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.recent_window_days must be positive, got {}",
                self.analysis.recent_window_days
            )));
        }
        if self.ingest.date_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "ingest.date_formats must list at least one format".to_string(),
            ));
        }
        if let Some(blank) = self.ingest.date_formats.iter().find(|f| f.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "ingest.date_formats contains a blank entry: {:?}",
                blank
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
