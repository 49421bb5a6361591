use crate::bucket::{BucketKey, BucketedRecord};
use crate::error::AnalyticsError;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use core_types::{DayOfWeek, Window};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Summary of one bucket within one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct AggregateCell {
    /// Mean of the non-missing metric values, `None` if there were none.
    pub mean: Option<Decimal>,
    /// Trades that fell into the bucket.
    pub trades: usize,
    /// Trades whose metric value was defined.
    pub samples: usize,
}

/// Per-bucket means for one window. A bucket with no usable values is still
/// present, with a missing mean.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    window: Window,
    cells: BTreeMap<BucketKey, AggregateCell>,
}

impl AggregateTable {
    pub fn window(&self) -> Window {
        self.window
    }

    pub fn get(&self, key: &BucketKey) -> Option<&AggregateCell> {
        self.cells.get(key)
    }

    /// Mean for a bucket. Missing both when the bucket is absent and when it
    /// had no usable values.
    pub fn mean(&self, time_opened: &str, day: DayOfWeek) -> Option<Decimal> {
        self.cells
            .get(&BucketKey::new(time_opened, day))
            .and_then(|cell| cell.mean)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &AggregateCell)> {
        self.cells.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BucketKey> {
        self.cells.keys()
    }

    pub fn days(&self) -> BTreeSet<DayOfWeek> {
        self.cells.keys().map(|k| k.day).collect()
    }

    pub fn has_day(&self, day: DayOfWeek) -> bool {
        self.cells.keys().any(|k| k.day == day)
    }

    pub fn time_labels(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|k| k.time_opened.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(serde::Serialize)]
struct AggregateEntry<'a> {
    time_opened: &'a str,
    day: DayOfWeek,
    #[serde(flatten)]
    cell: &'a AggregateCell,
}

// Struct keys cannot be JSON object keys, so buckets serialize as a list.
impl Serialize for AggregateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<AggregateEntry<'_>> = self
            .cells
            .iter()
            .map(|(key, cell)| AggregateEntry {
                time_opened: &key.time_opened,
                day: key.day,
                cell,
            })
            .collect();

        let mut state = serializer.serialize_struct("AggregateTable", 2)?;
        state.serialize_field("window", &self.window)?;
        state.serialize_field("buckets", &entries)?;
        state.end()
    }
}

/// Groups records by bucket and averages their metric values.
pub fn aggregate<'a, I>(window: Window, records: I) -> Result<AggregateTable, AnalyticsError>
where
    I: IntoIterator<Item = &'a BucketedRecord>,
{
    let mut groups: BTreeMap<BucketKey, (usize, Vec<Decimal>)> = BTreeMap::new();
    for record in records {
        let (trades, values) = groups.entry(record.key.clone()).or_default();
        *trades += 1;
        if let Some(value) = record.metric_value {
            values.push(value);
        }
    }

    let cells = groups
        .into_iter()
        .map(|(key, (trades, values))| {
            let cell = AggregateCell {
                mean: mean(values.iter().copied())?,
                trades,
                samples: values.len(),
            };
            Ok((key, cell))
        })
        .collect::<Result<_, AnalyticsError>>()?;

    Ok(AggregateTable { window, cells })
}

/// Aggregates every record.
pub fn aggregate_overall(records: &[BucketedRecord]) -> Result<AggregateTable, AnalyticsError> {
    aggregate(Window::Overall, records)
}

/// Aggregates records opened on or after `cutoff`. A date counts as its
/// midnight, so a trade on the cutoff's calendar day is only included when
/// the cutoff itself falls at midnight.
pub fn aggregate_recent(
    records: &[BucketedRecord],
    cutoff: NaiveDateTime,
) -> Result<AggregateTable, AnalyticsError> {
    aggregate(
        Window::Recent,
        records
            .iter()
            .filter(|r| r.date_opened.and_time(NaiveTime::MIN) >= cutoff),
    )
}

/// Start of the recent window, `None` if the span leaves chrono's range.
pub fn recent_cutoff(reference_time: NaiveDateTime, window_days: i64) -> Option<NaiveDateTime> {
    Duration::try_days(window_days).and_then(|span| reference_time.checked_sub_signed(span))
}

/// Arithmetic mean. `None` for an empty input, never zero.
///
/// Fails with `AnalyticsError::Calculation` when the running sum leaves
/// `Decimal`'s range.
pub(crate) fn mean<I>(values: I) -> Result<Option<Decimal>, AnalyticsError>
where
    I: IntoIterator<Item = Decimal>,
{
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;
    for value in values {
        sum = sum.checked_add(value).ok_or_else(|| {
            AnalyticsError::Calculation(format!("mean overflowed after {} values", count + 1))
        })?;
        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }
    sum.checked_div(Decimal::from(count))
        .map(Some)
        .ok_or_else(|| AnalyticsError::Calculation(format!("could not divide sum by {}", count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(date: NaiveDate, time: &str, value: Option<Decimal>) -> BucketedRecord {
        BucketedRecord {
            key: BucketKey::new(time, DayOfWeek::from_date(date)),
            date_opened: date,
            metric_value: value,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    }

    #[test]
    fn single_value_mean_is_the_value() {
        let table = aggregate_overall(&[record(monday(), "09:30", Some(dec!(17.25)))]).unwrap();
        assert_eq!(table.mean("09:30", DayOfWeek::Monday), Some(dec!(17.25)));
        assert_eq!(table.get(&BucketKey::new("09:30", DayOfWeek::Monday)).unwrap().trades, 1);
    }

    #[test]
    fn missing_values_are_skipped_not_zeroed() {
        let records = vec![
            record(monday(), "09:30", Some(dec!(10))),
            record(monday(), "09:30", None),
            record(monday(), "09:30", Some(dec!(20))),
        ];
        let table = aggregate_overall(&records).unwrap();
        let cell = table.get(&BucketKey::new("09:30", DayOfWeek::Monday)).unwrap();

        assert_eq!(cell.mean, Some(dec!(15)));
        assert_eq!(cell.trades, 3);
        assert_eq!(cell.samples, 2);
    }

    #[test]
    fn all_missing_group_keeps_key_with_missing_mean() {
        let table = aggregate_overall(&[record(monday(), "09:30", None)]).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.has_day(DayOfWeek::Monday));
        assert_eq!(table.mean("09:30", DayOfWeek::Monday), None);
    }

    #[test]
    fn recent_window_filters_by_cutoff() {
        let t0 = monday();
        // 18 weeks back: still a Monday, well outside the 90-day window.
        let old = t0 - Duration::days(126);
        let records = vec![
            record(t0, "09:30", Some(dec!(100))),
            record(old, "09:30", Some(dec!(-50))),
        ];
        let reference = t0.and_time(NaiveTime::MIN);
        let cutoff = recent_cutoff(reference, 90).unwrap();

        let overall = aggregate_overall(&records).unwrap();
        let recent = aggregate_recent(&records, cutoff).unwrap();

        assert_eq!(overall.mean("09:30", DayOfWeek::Monday), Some(dec!(25)));
        assert_eq!(recent.mean("09:30", DayOfWeek::Monday), Some(dec!(100)));
        assert!(recent.keys().all(|k| overall.get(k).is_some()));
    }

    #[test]
    fn cutoff_day_boundary_compares_midnight() {
        let reference = NaiveDate::from_ymd_opt(2024, 4, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let cutoff = recent_cutoff(reference, 90).unwrap();
        let boundary_day = cutoff.date();

        let records = vec![
            record(boundary_day, "09:30", Some(dec!(1))),
            record(boundary_day.succ_opt().unwrap(), "09:30", Some(dec!(2))),
        ];
        let recent = aggregate_recent(&records, cutoff).unwrap();

        // Midnight of the boundary day is before a noon cutoff.
        assert_eq!(recent.iter().map(|(_, c)| c.trades).sum::<usize>(), 1);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let cutoff = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_time(NaiveTime::MIN);
        let table = aggregate_recent(&[], cutoff).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.window(), Window::Recent);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::<Decimal>::new()).unwrap(), None);
        assert_eq!(mean(vec![dec!(1), dec!(2)]).unwrap(), Some(dec!(1.5)));
    }

    #[test]
    fn overflowing_bucket_sum_is_an_error() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let records = vec![
            record(monday(), "09:30", Some(huge)),
            record(monday(), "09:30", Some(huge)),
        ];

        let err = aggregate_overall(&records).unwrap_err();
        assert!(matches!(err, AnalyticsError::Calculation(_)));
        assert!(mean([Decimal::MAX, Decimal::ONE]).is_err());
    }

    #[test]
    fn serializes_buckets_as_a_list() {
        let table = aggregate_overall(&[record(monday(), "09:30", Some(dec!(3)))]).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["window"], "Overall");
        assert_eq!(json["buckets"][0]["time_opened"], "09:30");
        assert_eq!(json["buckets"][0]["day"], "Monday");
        assert_eq!(json["buckets"][0]["trades"], 1);
    }
}
