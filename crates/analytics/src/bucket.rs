use crate::metric::MetricCalculator;
use chrono::NaiveDate;
use core_types::{DayOfWeek, TradeRecord};
use rust_decimal::Decimal;
use serde::Serialize;

/// Aggregation key: the verbatim time label plus the weekday.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketKey {
    pub time_opened: String,
    pub day: DayOfWeek,
}

impl BucketKey {
    pub fn new(time_opened: impl Into<String>, day: DayOfWeek) -> Self {
        Self {
            time_opened: time_opened.into(),
            day,
        }
    }
}

/// A trade reduced to what the aggregator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedRecord {
    pub key: BucketKey,
    pub date_opened: NaiveDate,
    pub metric_value: Option<Decimal>,
}

/// Attaches the weekday and the derived metric to every record.
pub fn bucket_records(
    records: &[TradeRecord],
    calculator: &MetricCalculator,
) -> Vec<BucketedRecord> {
    records
        .iter()
        .map(|record| BucketedRecord {
            key: BucketKey::new(
                record.time_opened.clone(),
                DayOfWeek::from_date(record.date_opened),
            ),
            date_opened: record.date_opened,
            metric_value: calculator.value(record),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::MetricMode;
    use rust_decimal_macros::dec;

    #[test]
    fn weekday_comes_from_the_open_date() {
        // 2024-01-10 was a Wednesday.
        let records = vec![TradeRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            "10:15",
            Some(dec!(5)),
            Some(dec!(1)),
        )];
        let calc = MetricCalculator::for_records(&records, MetricMode::Pl);
        let bucketed = bucket_records(&records, &calc);

        assert_eq!(bucketed[0].key, BucketKey::new("10:15", DayOfWeek::Wednesday));
        assert_eq!(bucketed[0].metric_value, Some(dec!(1)));
    }

    #[test]
    fn time_labels_are_not_normalized() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let records = vec![
            TradeRecord::new(date, "9:30", None, Some(dec!(1))),
            TradeRecord::new(date, "09:30", None, Some(dec!(1))),
        ];
        let calc = MetricCalculator::for_records(&records, MetricMode::Pl);
        let bucketed = bucket_records(&records, &calc);
        assert_ne!(bucketed[0].key, bucketed[1].key);
    }
}
