//! OHLCV bars and the ordered price series an evaluation runs over.

use crate::domain::error::BackstatError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars in strictly increasing date order.
///
/// Index order is the temporal order every downstream computation relies on,
/// so construction rejects duplicates and out-of-order dates instead of
/// sorting them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, BackstatError> {
        if let Some(i) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(BackstatError::UnorderedBars {
                index: i + 1,
                date: bars[i + 1].date,
            });
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "BHP".into(),
            exchange: "ASX".into(),
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 50_000.0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn accepts_increasing_dates() {
        let series = PriceSeries::new(vec![bar(day(1), 100.0), bar(day(2), 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.dates().collect::<Vec<_>>(), vec![day(1), day(2)]);
        assert_eq!(series.bars()[1].close, 101.0);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![bar(day(1), 100.0), bar(day(1), 101.0)]).unwrap_err();
        assert!(matches!(err, BackstatError::UnorderedBars { index: 1, .. }));
    }

    #[test]
    fn rejects_backwards_dates() {
        let err = PriceSeries::new(vec![
            bar(day(1), 100.0),
            bar(day(3), 101.0),
            bar(day(2), 102.0),
        ])
        .unwrap_err();
        match err {
            BackstatError::UnorderedBars { index, date } => {
                assert_eq!(index, 2);
                assert_eq!(date, day(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.dates().count(), 0);
    }
}
