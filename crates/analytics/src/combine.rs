use crate::aggregate::AggregateTable;
use crate::error::AnalyticsError;
use chrono::NaiveTime;
use core_types::{DayOfWeek, Window};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Formats a time label may be written in, for row ordering only.
const TIME_LABEL_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// A matrix column: one window on one weekday, labelled e.g. `Overall_Monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub window: Window,
    pub day: DayOfWeek,
}

impl ColumnKey {
    pub fn new(window: Window, day: DayOfWeek) -> Self {
        Self { window, day }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.window.name(), self.day.name())
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Side-by-side Overall/Recent means, one row per time label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeMatrix {
    rows: Vec<String>,
    columns: Vec<ColumnKey>,
    cells: Vec<Vec<Option<Decimal>>>,
}

impl ComparativeMatrix {
    /// Builds a matrix from parts, checking that every row has one cell per column.
    pub fn new(
        rows: Vec<String>,
        columns: Vec<ColumnKey>,
        cells: Vec<Vec<Option<Decimal>>>,
    ) -> Result<Self, AnalyticsError> {
        if cells.len() != rows.len() {
            return Err(AnalyticsError::MatrixShape(format!(
                "{} row labels but {} rows of cells",
                rows.len(),
                cells.len()
            )));
        }
        if let Some((i, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(AnalyticsError::MatrixShape(format!(
                "row {} ('{}') has {} cells, expected {}",
                i,
                rows[i],
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { rows, columns, cells })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn cells(&self) -> &[Vec<Option<Decimal>>] {
        &self.cells
    }

    pub fn get(&self, row: usize, column: usize) -> Option<Decimal> {
        self.cells.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    /// Looks a cell up by labels.
    pub fn value(&self, time_opened: &str, column: ColumnKey) -> Option<Decimal> {
        let row = self.rows.iter().position(|r| r == time_opened)?;
        let col = self.columns.iter().position(|c| *c == column)?;
        self.get(row, col)
    }

    /// Non-missing values of one column, top to bottom.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Decimal> + '_ {
        self.cells.iter().filter_map(move |row| row.get(column).copied().flatten())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Outer-joins the two window aggregates into a `ComparativeMatrix`.
///
/// Weekdays present in either table produce an `Overall_<Day>`,
/// `Recent_<Day>` pair, Monday to Friday. Weekend buckets never become
/// columns, but their time labels still contribute rows.
pub fn combine(overall: &AggregateTable, recent: &AggregateTable) -> ComparativeMatrix {
    let columns: Vec<ColumnKey> = DayOfWeek::TRADING_DAYS
        .iter()
        .filter(|day| overall.has_day(**day) || recent.has_day(**day))
        .flat_map(|day| {
            [
                ColumnKey::new(Window::Overall, *day),
                ColumnKey::new(Window::Recent, *day),
            ]
        })
        .collect();

    let mut rows: Vec<String> = overall
        .time_labels()
        .union(&recent.time_labels())
        .map(|label| label.to_string())
        .collect();
    rows.sort_by(|a, b| compare_time_labels(a, b));

    let cells = rows
        .iter()
        .map(|time| {
            columns
                .iter()
                .map(|column| match column.window {
                    Window::Overall => overall.mean(time, column.day),
                    Window::Recent => recent.mean(time, column.day),
                })
                .collect()
        })
        .collect();

    tracing::debug!(rows = rows.len(), columns = columns.len(), "Combined window aggregates.");
    ComparativeMatrix { rows, columns, cells }
}

fn parse_time_label(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    TIME_LABEL_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(label, fmt).ok())
}

/// Clock-like labels first in chronological order, everything else after,
/// with the raw text breaking ties.
fn compare_time_labels(a: &str, b: &str) -> Ordering {
    match (parse_time_label(a), parse_time_label(b)) {
        (Some(ta), Some(tb)) => ta.cmp(&tb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_overall, aggregate_recent};
    use crate::bucket::{BucketKey, BucketedRecord};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    // 2024-01-08 is a Monday; offsets below pick the other weekdays.
    fn record(day_offset: u64, time: &str, value: Decimal) -> BucketedRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap() + chrono::Days::new(day_offset);
        BucketedRecord {
            key: BucketKey::new(time, DayOfWeek::from_date(date)),
            date_opened: date,
            metric_value: Some(value),
        }
    }

    fn cutoff_after_everything() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_time(NaiveTime::MIN)
    }

    #[test]
    fn columns_are_paired_in_weekday_order() {
        // Friday first, then Tuesday, then Saturday.
        let records = vec![
            record(4, "10:00", dec!(1)),
            record(1, "09:30", dec!(2)),
            record(5, "11:00", dec!(3)),
        ];
        let overall = aggregate_overall(&records).unwrap();
        let recent = aggregate_recent(&records, cutoff_after_everything()).unwrap();
        let matrix = combine(&overall, &recent);

        let labels: Vec<String> = matrix.columns().iter().map(ColumnKey::label).collect();
        assert_eq!(
            labels,
            vec!["Overall_Tuesday", "Recent_Tuesday", "Overall_Friday", "Recent_Friday"]
        );
    }

    #[test]
    fn column_count_is_twice_the_weekday_count() {
        let records: Vec<_> = (0..7).map(|d| record(d, "09:30", dec!(1))).collect();
        let overall = aggregate_overall(&records).unwrap();
        let recent = aggregate_recent(&records, cutoff_after_everything()).unwrap();
        let matrix = combine(&overall, &recent);
        assert_eq!(matrix.columns().len(), 10);
    }

    #[test]
    fn day_in_one_window_still_gets_both_columns() {
        let overall = aggregate_overall(&[record(0, "09:30", dec!(5))]).unwrap();
        let since_forever = NaiveDate::MIN.and_time(NaiveTime::MIN);
        let recent = aggregate_recent(&[record(2, "09:30", dec!(7))], since_forever).unwrap();
        let matrix = combine(&overall, &recent);

        let key = ColumnKey::new;
        assert_eq!(matrix.columns().len(), 4);
        assert_eq!(matrix.value("09:30", key(Window::Overall, DayOfWeek::Monday)), Some(dec!(5)));
        assert_eq!(matrix.value("09:30", key(Window::Recent, DayOfWeek::Monday)), None);
        assert_eq!(matrix.value("09:30", key(Window::Overall, DayOfWeek::Wednesday)), None);
        assert_eq!(
            matrix.value("09:30", key(Window::Recent, DayOfWeek::Wednesday)),
            Some(dec!(7))
        );
    }

    #[test]
    fn rows_are_outer_joined_and_time_ordered() {
        let overall =
            aggregate_overall(&[record(0, "10:00", dec!(1)), record(0, "9:30", dec!(1))]).unwrap();
        let recent = aggregate_recent(
            &[record(0, "13:45", dec!(1)), record(5, "Weekend", dec!(1))],
            NaiveDate::MIN.and_time(NaiveTime::MIN),
        )
        .unwrap();
        let matrix = combine(&overall, &recent);

        assert_eq!(matrix.rows(), &["9:30", "10:00", "13:45", "Weekend"]);
        let weekend_row = matrix.rows().iter().position(|r| r == "Weekend").unwrap();
        assert!(matrix.cells()[weekend_row].iter().all(Option::is_none));
    }

    #[test]
    fn same_clock_time_falls_back_to_raw_text() {
        assert_eq!(compare_time_labels("09:30", "9:30"), Ordering::Less);
        assert_eq!(compare_time_labels("9:30", "09:30:00"), Ordering::Greater);
        assert_eq!(compare_time_labels("9:30", "9:30"), Ordering::Equal);

        // Distinct labels stay distinct rows even when they name the same minute.
        let records = vec![
            record(0, "9:30", dec!(1)),
            record(0, "09:30", dec!(2)),
            record(0, "09:29", dec!(3)),
        ];
        let overall = aggregate_overall(&records).unwrap();
        let recent = aggregate_recent(&records, cutoff_after_everything()).unwrap();
        let matrix = combine(&overall, &recent);

        assert_eq!(matrix.rows(), &["09:29", "09:30", "9:30"]);
        let monday = ColumnKey::new(Window::Overall, DayOfWeek::Monday);
        assert_eq!(matrix.value("09:30", monday), Some(dec!(2)));
        assert_eq!(matrix.value("9:30", monday), Some(dec!(1)));
    }

    #[test]
    fn empty_aggregates_give_empty_matrix() {
        let overall = aggregate_overall(&[]).unwrap();
        let recent = aggregate_recent(&[], cutoff_after_everything()).unwrap();
        let matrix = combine(&overall, &recent);
        assert!(matrix.is_empty());
        assert!(matrix.columns().is_empty());
    }

    #[test]
    fn constructor_rejects_ragged_cells() {
        let err = ComparativeMatrix::new(
            vec!["09:30".to_string()],
            vec![ColumnKey::new(Window::Overall, DayOfWeek::Monday)],
            vec![vec![Some(dec!(1)), None]],
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::MatrixShape(_)));
    }

    #[test]
    fn column_key_serializes_as_label() {
        let key = ColumnKey::new(Window::Recent, DayOfWeek::Thursday);
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Recent_Thursday\"");
    }
}
