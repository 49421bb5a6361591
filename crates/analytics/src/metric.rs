use core_types::{MetricMode, TradeRecord};
use rust_decimal::Decimal;

/// Derives the per-trade value that gets averaged into buckets.
///
/// Normalized P/L needs the largest premium of the whole batch, so the
/// calculator is built from the full record set first and applied second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCalculator {
    mode: MetricMode,
    max_premium: Option<Decimal>,
}

impl MetricCalculator {
    pub fn for_records(records: &[TradeRecord], mode: MetricMode) -> Self {
        let max_premium = match mode {
            MetricMode::NormalizedPl => records.iter().filter_map(|r| r.premium).max(),
            MetricMode::Pl | MetricMode::Pcr => None,
        };

        tracing::debug!(?mode, ?max_premium, "Prepared metric calculator.");
        Self { mode, max_premium }
    }

    pub fn mode(&self) -> MetricMode {
        self.mode
    }

    /// Largest premium in the batch. Only tracked for Normalized P/L.
    pub fn max_premium(&self) -> Option<Decimal> {
        self.max_premium
    }

    /// Returns `None` when the metric is undefined for this record
    /// (missing inputs, or a zero premium for the ratio modes).
    pub fn value(&self, record: &TradeRecord) -> Option<Decimal> {
        match self.mode {
            MetricMode::Pl => record.pl,
            MetricMode::Pcr => premium_ratio(record),
            MetricMode::NormalizedPl => premium_ratio(record)?.checked_mul(self.max_premium?),
        }
    }
}

fn premium_ratio(record: &TradeRecord) -> Option<Decimal> {
    let premium = record.premium?;
    if premium.is_zero() {
        return None;
    }
    record.pl?.checked_div(premium)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(premium: Option<Decimal>, pl: Option<Decimal>) -> TradeRecord {
        TradeRecord::new(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(), "09:30", premium, pl)
    }

    #[test]
    fn pl_mode_passes_raw_value_through() {
        let records = vec![trade(Some(dec!(0)), Some(dec!(-42.5)))];
        let calc = MetricCalculator::for_records(&records, MetricMode::Pl);
        assert_eq!(calc.value(&records[0]), Some(dec!(-42.5)));
        assert_eq!(calc.max_premium(), None);
    }

    #[test]
    fn pcr_is_unscaled_ratio() {
        let records = vec![trade(Some(dec!(50)), Some(dec!(25)))];
        let calc = MetricCalculator::for_records(&records, MetricMode::Pcr);
        assert_eq!(calc.value(&records[0]), Some(dec!(0.5)));
    }

    #[test]
    fn normalized_pl_scales_by_batch_max_premium() {
        let records = vec![
            trade(Some(dec!(50)), Some(dec!(25))),
            trade(Some(dec!(200)), Some(dec!(-100))),
            trade(None, Some(dec!(10))),
        ];
        let calc = MetricCalculator::for_records(&records, MetricMode::NormalizedPl);

        assert_eq!(calc.max_premium(), Some(dec!(200)));
        assert_eq!(calc.value(&records[0]), Some(dec!(100)));
        assert_eq!(calc.value(&records[1]), Some(dec!(-100)));
        assert_eq!(calc.value(&records[2]), None);
    }

    #[test]
    fn normalized_pl_without_any_premium_is_all_missing() {
        let records = vec![trade(None, Some(dec!(25))), trade(None, Some(dec!(-10)))];
        let calc = MetricCalculator::for_records(&records, MetricMode::NormalizedPl);

        assert_eq!(calc.max_premium(), None);
        assert!(records.iter().all(|r| calc.value(r).is_none()));
    }

    #[test]
    fn zero_premium_yields_missing_not_error() {
        let records = vec![trade(Some(Decimal::ZERO), Some(dec!(10)))];
        for mode in [MetricMode::Pcr, MetricMode::NormalizedPl] {
            let calc = MetricCalculator::for_records(&records, mode);
            assert_eq!(calc.value(&records[0]), None, "mode {mode:?}");
        }
    }

    #[test]
    fn missing_pl_is_missing_in_every_mode() {
        let records = vec![trade(Some(dec!(10)), None)];
        for mode in [MetricMode::Pl, MetricMode::Pcr, MetricMode::NormalizedPl] {
            let calc = MetricCalculator::for_records(&records, mode);
            assert_eq!(calc.value(&records[0]), None, "mode {mode:?}");
        }
    }
}
