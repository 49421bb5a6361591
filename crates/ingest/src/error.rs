use thiserror::Error;

/// Fatal problems with an uploaded batch. Any one of them aborts the whole batch.
#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("Required column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("Row {row}: could not parse date '{value}' in column 'Date Opened'")]
    DateParse { row: usize, value: String },

    #[error("Row {row}: could not parse number '{value}' in column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to open input file: {0}")]
    Io(#[from] std::io::Error),
}
