//! Pluggable position signals.
//!
//! A strategy is anything that turns a price series into one position per
//! bar. The evaluation pipeline treats it as a black box and only checks the
//! shape of what comes back.

use crate::domain::error::BackstatError;
use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::position::PositionSeries;

pub trait StrategySignal {
    fn name(&self) -> &str;

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError>;
}

impl<T: StrategySignal + ?Sized> StrategySignal for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError> {
        (**self).generate_positions(prices)
    }
}

impl<T: StrategySignal + ?Sized> StrategySignal for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError> {
        (**self).generate_positions(prices)
    }
}

/// Trend following against a simple moving average: `long` while the close
/// is above SMA(period), `short` otherwise. Bars before the average exists
/// count as "not above".
#[derive(Debug, Clone, PartialEq)]
pub struct SmaTrend {
    pub period: usize,
    pub long: f64,
    pub short: f64,
}

impl Default for SmaTrend {
    fn default() -> Self {
        Self {
            period: 50,
            long: 1.0,
            short: -1.0,
        }
    }
}

impl StrategySignal for SmaTrend {
    fn name(&self) -> &str {
        "sma_trend"
    }

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError> {
        let sma = calculate_sma(prices.bars(), self.period);
        let values = prices
            .bars()
            .iter()
            .zip(&sma)
            .map(|(bar, avg)| {
                if avg.valid && bar.close > avg.value {
                    self.long
                } else {
                    self.short
                }
            })
            .collect();
        PositionSeries::for_prices(prices, values)
    }
}

/// Constant long exposure of 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuyAndHold;

impl StrategySignal for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError> {
        PositionSeries::for_prices(prices, vec![1.0; prices.len()])
    }
}

/// Adapts a plain function of the price series into a strategy.
pub struct FnSignal<F> {
    name: String,
    f: F,
}

impl<F> FnSignal<F>
where
    F: Fn(&PriceSeries) -> Vec<f64>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> StrategySignal for FnSignal<F>
where
    F: Fn(&PriceSeries) -> Vec<f64>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_positions(&self, prices: &PriceSeries) -> Result<PositionSeries, BackstatError> {
        PositionSeries::for_prices(prices, (self.f)(prices))
    }
}

/// Built-in strategies selectable from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    SmaTrend(SmaTrend),
    BuyAndHold,
}

impl StrategyKind {
    pub fn build(&self) -> Box<dyn StrategySignal + Send + Sync> {
        match self {
            Self::SmaTrend(s) => Box::new(s.clone()),
            Self::BuyAndHold => Box::new(BuyAndHold),
        }
    }
}
