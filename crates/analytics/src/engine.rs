use crate::aggregate::{aggregate_overall, aggregate_recent, recent_cutoff};
use crate::bucket::bucket_records;
use crate::combine::combine;
use crate::error::AnalyticsError;
use crate::mask::create_policy;
use crate::metric::MetricCalculator;
use crate::report::{EngineWarning, HeatmapReport, RunParameters};
use core_types::TradeRecord;
use ingest::{Ingestor, RawTable};

/// A stateless calculator that turns a trade log into a highlighted
/// day-of-week / time-of-day matrix.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for an uploaded trade log.
    ///
    /// # Arguments
    ///
    /// * `ingestor` - Validates the raw rows and applies the legs filter.
    /// * `table` - The raw rows as handed over by the upload layer.
    /// * `params` - Metric, policy, reference time and recent-window span.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `HeatmapReport` or an `AnalyticsError`. Any
    /// malformed retained row fails the whole run.
    pub fn run(
        &self,
        ingestor: &Ingestor,
        table: &RawTable,
        params: &RunParameters,
    ) -> Result<HeatmapReport, AnalyticsError> {
        let batch = ingestor.ingest(table)?;
        self.build_report(&batch.records, batch.excluded, params)
    }

    /// Runs the pipeline over records that were already validated.
    pub fn analyze(
        &self,
        records: &[TradeRecord],
        params: &RunParameters,
    ) -> Result<HeatmapReport, AnalyticsError> {
        self.build_report(records, 0, params)
    }

    #[tracing::instrument(
        name = "heatmap_run",
        skip(self, records),
        fields(trades = records.len())
    )]
    fn build_report(
        &self,
        records: &[TradeRecord],
        excluded: usize,
        params: &RunParameters,
    ) -> Result<HeatmapReport, AnalyticsError> {
        if params.recent_window_days <= 0 {
            return Err(AnalyticsError::InvalidParameters(format!(
                "recent window must span at least one day, got {}",
                params.recent_window_days
            )));
        }
        let cutoff = recent_cutoff(params.reference_time, params.recent_window_days).ok_or_else(|| {
            AnalyticsError::InvalidParameters(format!(
                "a {}-day window before {} is out of range",
                params.recent_window_days, params.reference_time
            ))
        })?;

        // 1. Derive per-trade metric and bucket key
        let calculator = MetricCalculator::for_records(records, params.metric);
        let bucketed = bucket_records(records, &calculator);

        // 2. Aggregate both windows
        let overall = aggregate_overall(&bucketed)?;
        let recent = aggregate_recent(&bucketed, cutoff)?;
        let recent_records = recent.iter().map(|(_, cell)| cell.trades).sum();

        let mut warnings = Vec::new();
        if recent.is_empty() {
            tracing::warn!(%cutoff, "Recent window is empty.");
            warnings.push(EngineWarning::EmptyRecentWindow { cutoff });
        }

        // 3. Combine and mask
        let matrix = combine(&overall, &recent);
        let outcome = create_policy(params.policy).apply(&matrix)?;
        if let Some(column) = outcome.unpaired_column {
            warnings.push(EngineWarning::UnpairedTrailingColumn {
                column: column.label(),
            });
        }

        let report = HeatmapReport {
            parameters: *params,
            recent_cutoff: cutoff,
            total_records: records.len(),
            excluded_records: excluded,
            recent_records,
            overall,
            recent,
            matrix,
            mask: outcome.mask,
            global_threshold: outcome.global_threshold,
            warnings,
        };

        tracing::info!(
            rows = report.matrix.rows().len(),
            columns = report.matrix.columns().len(),
            highlighted = report.highlighted_cells(),
            "Heatmap computed."
        );
        Ok(report)
    }
}
