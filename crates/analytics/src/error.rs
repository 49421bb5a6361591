use ingest::DataFormatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Trade log rejected: {0}")]
    DataFormat(#[from] DataFormatError),

    #[error("Invalid run parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed comparative matrix: {0}")]
    MatrixShape(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
