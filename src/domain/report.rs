//! Evaluation pipeline and the statistics snapshot it produces.

use crate::domain::distribution::{BetaFit, BetaMleFitter, DistributionFitter};
use crate::domain::drawdown::max_drawdown;
use crate::domain::error::{BackstatError, StatisticError};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::position::PositionSeries;
use crate::domain::returns::{compute_returns, ReturnSeries};
use crate::domain::strategy::StrategySignal;
use statrs::statistics::Statistics;

/// Summary statistics of one evaluation run.
///
/// `mean` and `variance` are NaN when there are too few returns (none, and
/// fewer than two, respectively). The two beta fits fail independently of
/// each other and of the remaining fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub observations: usize,
    pub discarded: usize,
    pub mean: f64,
    pub variance: f64,
    pub beta: Result<BetaFit, StatisticError>,
    pub downside_beta: Result<BetaFit, StatisticError>,
    pub max_drawdown: f64,
}

impl StatisticsReport {
    /// Shape parameter of the full-sample fit.
    pub fn beta_shape(&self) -> Result<f64, StatisticError> {
        self.beta.clone().map(|fit| fit.alpha)
    }

    /// Shape parameter of the negative-returns fit.
    pub fn downside_beta_shape(&self) -> Result<f64, StatisticError> {
        self.downside_beta.clone().map(|fit| fit.alpha)
    }

    /// Statistics over an already-computed return series.
    pub fn from_returns<F: DistributionFitter>(returns: &ReturnSeries, fitter: &F) -> Self {
        let values = returns.values();
        let downside = returns.downside();

        Self {
            observations: values.len(),
            discarded: returns.discarded,
            mean: values.iter().mean(),
            variance: values.iter().variance(),
            beta: fit_labelled(fitter, "beta", &values),
            downside_beta: fit_labelled(fitter, "downside_beta", &downside),
            max_drawdown: max_drawdown(&values),
        }
    }
}

fn fit_labelled<F: DistributionFitter>(
    fitter: &F,
    statistic: &'static str,
    sample: &[f64],
) -> Result<BetaFit, StatisticError> {
    fitter.fit(sample).map_err(|err| match err {
        StatisticError::EmptyInput { .. } => StatisticError::EmptyInput { statistic },
        StatisticError::FitDiverged { reason, .. } => {
            StatisticError::FitDiverged { statistic, reason }
        }
    })
}

/// Report for `positions` applied to `prices`, using the default fitter.
pub fn build_report(
    prices: &PriceSeries,
    positions: &PositionSeries,
) -> Result<StatisticsReport, BackstatError> {
    build_report_with(prices, positions, &BetaMleFitter::default())
}

pub fn build_report_with<F: DistributionFitter>(
    prices: &PriceSeries,
    positions: &PositionSeries,
    fitter: &F,
) -> Result<StatisticsReport, BackstatError> {
    let returns = compute_returns(prices, positions)?;
    Ok(StatisticsReport::from_returns(&returns, fitter))
}

/// The outcome of an [`EvaluationRequest`]: statistics plus the return
/// series they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub strategy: String,
    pub report: StatisticsReport,
    pub returns: ReturnSeries,
}

/// One evaluation run: a price history, a strategy and a fitter.
pub struct EvaluationRequest<S, F = BetaMleFitter> {
    pub prices: PriceSeries,
    pub strategy: S,
    pub fitter: F,
}

impl<S: StrategySignal> EvaluationRequest<S> {
    pub fn new(prices: PriceSeries, strategy: S) -> Self {
        Self {
            prices,
            strategy,
            fitter: BetaMleFitter::default(),
        }
    }
}

impl<S: StrategySignal, F: DistributionFitter> EvaluationRequest<S, F> {
    pub fn with_fitter<G: DistributionFitter>(self, fitter: G) -> EvaluationRequest<S, G> {
        EvaluationRequest {
            prices: self.prices,
            strategy: self.strategy,
            fitter,
        }
    }

    pub fn run(&self) -> Result<Evaluation, BackstatError> {
        let positions = self.strategy.generate_positions(&self.prices)?;
        let returns = compute_returns(&self.prices, &positions)?;
        let report = StatisticsReport::from_returns(&returns, &self.fitter);

        tracing::debug!(
            strategy = self.strategy.name(),
            bars = self.prices.len(),
            observations = report.observations,
            discarded = report.discarded,
            "evaluation complete"
        );

        Ok(Evaluation {
            strategy: self.strategy.name().to_string(),
            report,
            returns,
        })
    }
}
