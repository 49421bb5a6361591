//! # tradeclock Analytics Engine
//!
//! This crate finds out when a strategy trades well: it averages a per-trade
//! metric by (time-of-day, day-of-week), compares full history against a
//! recent window, and highlights the cells that stand out.
//!
//! ## Architectural Principles
//!
//! - **Pure Pipeline:** ingest → metric → bucket → aggregate (overall and
//!   recent) → combine → mask. Each stage returns fresh values and nothing
//!   is kept between runs.
//! - **Explicit Inputs:** the reference time for the recent window is always
//!   a parameter. The engine never reads the system clock.
//! - **Missing Is Not Zero:** undefined metrics and empty buckets stay `None`
//!   from the first stage to the mask.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: runs the pipeline.
//! - `RunParameters`: metric, mask policy, reference time and window span.
//! - `HeatmapReport`: matrix, mask, baseline and warnings.
//! - `SignificancePolicy` / `create_policy`: the pluggable highlighting rules.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod aggregate;
pub mod bucket;
pub mod combine;
pub mod engine;
pub mod error;
pub mod mask;
pub mod metric;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use aggregate::{AggregateCell, AggregateTable};
pub use bucket::{BucketKey, BucketedRecord};
pub use combine::{ColumnKey, ComparativeMatrix};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use mask::{
    create_policy, ColumnMeanPolicy, GlobalSynergyPolicy, Mask, MaskOutcome, SignificancePolicy,
};
pub use metric::MetricCalculator;
pub use report::{EngineWarning, HeatmapReport, RunParameters};
