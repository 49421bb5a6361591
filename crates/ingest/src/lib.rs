//! # Trade Log Ingestion
//!
//! Turns an uploaded trade log into typed `TradeRecord`s.
//!
//! - `csv_loader` reads CSV bytes into an untyped `RawTable`.
//! - `Ingestor` resolves the required columns once, drops excluded rows and
//!   parses every remaining row. A single malformed row fails the whole batch.

pub mod csv_loader;
pub mod error;
pub mod ingestor;
pub mod table;

pub use csv_loader::{read_csv, read_csv_path};
pub use error::DataFormatError;
pub use ingestor::{IngestedBatch, Ingestor};
pub use table::{RawTable, REQUIRED_COLUMNS};
