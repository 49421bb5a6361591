use crate::error::DataFormatError;
use crate::table::{self, RawTable};
use chrono::{NaiveDate, NaiveDateTime};
use configuration::IngestSettings;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// The typed result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedBatch {
    pub records: Vec<TradeRecord>,
    /// Rows dropped by the legs filter.
    pub excluded: usize,
}

/// Column positions resolved once against the header row.
struct ColumnMap {
    date: usize,
    time: usize,
    premium: usize,
    pl: usize,
    legs: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &RawTable) -> Result<Self, DataFormatError> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| DataFormatError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            date: find(table::DATE_OPENED)?,
            time: find(table::TIME_OPENED)?,
            premium: find(table::PREMIUM)?,
            pl: find(table::PL)?,
            legs: table.column_index(table::LEGS),
        })
    }
}

/// Validates raw rows and turns them into `TradeRecord`s.
///
/// The batch is all-or-nothing: the first malformed retained row aborts it.
#[derive(Debug, Clone)]
pub struct Ingestor {
    settings: IngestSettings,
}

impl Ingestor {
    pub fn new(settings: IngestSettings) -> Self {
        Self { settings }
    }

    pub fn ingest(&self, table: &RawTable) -> Result<IngestedBatch, DataFormatError> {
        let columns = ColumnMap::resolve(table)?;
        let expected = table.headers.len();

        let mut records = Vec::with_capacity(table.len());
        let mut excluded = 0;

        for (i, row) in table.rows.iter().enumerate() {
            let row_number = i + 1;
            if row.len() != expected {
                return Err(DataFormatError::RaggedRow {
                    row: row_number,
                    expected,
                    found: row.len(),
                });
            }

            let legs = columns
                .legs
                .map(|idx| row[idx].as_str())
                .filter(|cell| !cell.is_empty());

            if let Some(legs) = legs {
                if self.is_excluded(legs) {
                    excluded += 1;
                    continue;
                }
            }

            let date_cell = &row[columns.date];
            let date_opened = self
                .parse_date(date_cell)
                .ok_or_else(|| DataFormatError::DateParse {
                    row: row_number,
                    value: date_cell.clone(),
                })?;

            let premium = parse_number(&row[columns.premium]).map_err(|value| {
                DataFormatError::InvalidNumber {
                    row: row_number,
                    column: table::PREMIUM.to_string(),
                    value,
                }
            })?;
            let pl = parse_number(&row[columns.pl]).map_err(|value| {
                DataFormatError::InvalidNumber {
                    row: row_number,
                    column: table::PL.to_string(),
                    value,
                }
            })?;

            records.push(TradeRecord {
                date_opened,
                time_opened: row[columns.time].clone(),
                premium,
                pl,
                legs: legs.map(str::to_string),
            });
        }

        tracing::info!(
            rows = table.len(),
            retained = records.len(),
            excluded,
            "Ingested trade log."
        );

        Ok(IngestedBatch { records, excluded })
    }

    fn is_excluded(&self, legs: &str) -> bool {
        let pattern = self.settings.excluded_legs_pattern.as_str();
        !pattern.is_empty() && legs.contains(pattern)
    }

    /// Tries each configured format in order. Date-time formats keep only the date.
    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        self.settings.date_formats.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(value, fmt).ok().map(|dt| dt.date()))
        })
    }
}

/// Parses a money-like cell. Blank is `Ok(None)`; garbage returns the raw text.
fn parse_number(cell: &str) -> Result<Option<Decimal>, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .strip_prefix('$')
        .unwrap_or(body)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| cell.to_string())?;

    Ok(Some(if negative { -value } else { value }))
}
