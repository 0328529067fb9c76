//! Realized strategy returns with a one-bar execution lag.

use crate::domain::error::BackstatError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::position::PositionSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Finite realized returns in temporal order.
///
/// Bars whose return could not be computed are absent rather than marked;
/// `discarded` counts how many were dropped after the first bar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub points: Vec<ReturnPoint>,
    pub discarded: usize,
}

impl ReturnSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Strictly negative returns, in order.
    pub fn downside(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|&r| r < 0.0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Realized return at bar t = (close[t] / close[t-1] - 1) * position[t-1].
///
/// The position decided on bar t's close only earns from bar t+1 onwards.
/// Non-finite results (a zero prior close, a non-finite position) are
/// dropped and counted.
pub fn compute_returns(
    prices: &PriceSeries,
    positions: &PositionSeries,
) -> Result<ReturnSeries, BackstatError> {
    positions.check_aligned(prices)?;

    let bars = prices.bars();
    let lagged = positions.values();
    let mut series = ReturnSeries {
        points: Vec::with_capacity(bars.len().saturating_sub(1)),
        discarded: 0,
    };

    for t in 1..bars.len() {
        let prev_close = bars[t - 1].close;
        let bar_return = (bars[t].close - prev_close) / prev_close;
        let realized = bar_return * lagged[t - 1];

        if realized.is_finite() {
            series.points.push(ReturnPoint {
                date: bars[t].date,
                value: realized,
            });
        } else {
            series.discarded += 1;
        }
    }

    if series.discarded > 0 {
        tracing::debug!(
            discarded = series.discarded,
            kept = series.points.len(),
            "dropped non-finite realized returns"
        );
    }

    Ok(series)
}
