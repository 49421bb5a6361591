use serde::{Deserialize, Serialize};

pub const DATE_OPENED: &str = "Date Opened";
pub const TIME_OPENED: &str = "Time Opened";
pub const PREMIUM: &str = "Premium";
pub const PL: &str = "P/L";
pub const LEGS: &str = "Legs";

/// Columns every trade log must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [DATE_OPENED, TIME_OPENED, PREMIUM, PL];

/// An untyped grid of cells, exactly as handed over by the upload layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor for tables assembled in code.
    pub fn from_rows<H, R, C>(headers: &[H], rows: R) -> Self
    where
        H: AsRef<str>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
