//! Simple moving average over closing prices.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: the first (n-1) bars are invalid.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> Vec<IndicatorPoint> {
    let mut values = Vec::with_capacity(bars.len());
    let warmup = period.saturating_sub(1);
    let mut window_sum = 0.0_f64;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if period > 0 && i >= period {
            window_sum -= bars[i - period].close;
        }

        let valid = period > 0 && i >= warmup;
        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: if valid {
                window_sum / period as f64
            } else {
                0.0
            },
        });
    }

    values
}
