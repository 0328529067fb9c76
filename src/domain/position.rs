//! Position decisions aligned bar-for-bar with a price series.

use crate::domain::error::BackstatError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

/// One signed exposure per bar: positive long, negative short, zero flat.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PositionSeries {
    /// Pair `values` with the dates of `prices`.
    pub fn for_prices(prices: &PriceSeries, values: Vec<f64>) -> Result<Self, BackstatError> {
        if values.len() != prices.len() {
            return Err(BackstatError::Alignment {
                reason: format!("{} positions for {} bars", values.len(), prices.len()),
            });
        }
        Ok(Self {
            dates: prices.dates().collect(),
            values,
        })
    }

    pub fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, BackstatError> {
        if dates.len() != values.len() {
            return Err(BackstatError::Alignment {
                reason: format!("{} positions for {} dates", values.len(), dates.len()),
            });
        }
        Ok(Self { dates, values })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks that this series indexes exactly the bars of `prices`.
    pub fn check_aligned(&self, prices: &PriceSeries) -> Result<(), BackstatError> {
        if self.len() != prices.len() {
            return Err(BackstatError::Alignment {
                reason: format!("{} positions for {} bars", self.len(), prices.len()),
            });
        }
        if let Some((i, (pos_date, bar_date))) = self
            .dates
            .iter()
            .zip(prices.dates())
            .enumerate()
            .find(|(_, (p, b))| **p != *b)
        {
            return Err(BackstatError::Alignment {
                reason: format!("index {i}: position dated {pos_date}, bar dated {bar_date}"),
            });
        }
        Ok(())
    }
}
