use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single trade as it comes out of the ingestor.
///
/// Numeric fields are `Option` because trade logs routinely carry blank
/// cells. A blank stays blank all the way through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date_opened: NaiveDate,
    /// Opaque time-of-day label, compared textually.
    pub time_opened: String,
    pub premium: Option<Decimal>,
    pub pl: Option<Decimal>,
    pub legs: Option<String>,
}

impl TradeRecord {
    pub fn new(
        date_opened: NaiveDate,
        time_opened: impl Into<String>,
        premium: Option<Decimal>,
        pl: Option<Decimal>,
    ) -> Self {
        Self {
            date_opened,
            time_opened: time_opened.into(),
            premium,
            pl,
            legs: None,
        }
    }

    pub fn with_legs(mut self, legs: impl Into<String>) -> Self {
        self.legs = Some(legs.into());
        self
    }
}
