//! Beta distribution fits used as return-shape summaries.
//!
//! The beta family lives on [0, 1] while realized returns are signed and
//! unbounded. [`BetaMleFitter`] fits the raw returns anyway, with a free
//! location and scale absorbing the mismatch. [`NormalizedBetaFitter`] maps
//! the sample into (0, 1) first and fits only the two shapes.

use crate::domain::error::StatisticError;
use crate::domain::optimize::{nelder_mead, SimplexOptions};
use statrs::function::gamma::ln_gamma;

/// `ln(f64::MAX)`; each unusable observation costs 100 times this.
const LN_F64_MAX: f64 = 709.782_712_893_384;
/// Margin added on both sides of the sample range when a support has to be
/// derived from the data.
const SUPPORT_MARGIN: f64 = 0.1;
const MOMENT_SOLVE_MAX_ITER: usize = 100;
const MOMENT_SOLVE_TOL: f64 = 1e-10;
const LN_SHAPE_MIN: f64 = -6.907_755_278_982_137; // ln(1e-3)
const LN_SHAPE_MAX: f64 = 16.118_095_650_958_32; // ln(1e7)

/// A fitted four-parameter beta: `x = loc + scale * z`, `z ~ Beta(alpha, beta)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaFit {
    pub alpha: f64,
    pub beta: f64,
    pub loc: f64,
    pub scale: f64,
}

impl BetaFit {
    fn is_valid(&self) -> bool {
        [self.alpha, self.beta, self.loc, self.scale]
            .iter()
            .all(|v| v.is_finite())
            && self.alpha > 0.0
            && self.beta > 0.0
            && self.scale > 0.0
    }
}

/// Fits a beta distribution to a sample of returns.
pub trait DistributionFitter {
    fn fit(&self, sample: &[f64]) -> Result<BetaFit, StatisticError>;

    /// The first shape parameter (alpha) of the fit.
    fn fit_beta_shape(&self, returns: &[f64]) -> Result<f64, StatisticError> {
        self.fit(returns).map(|fit| fit.alpha)
    }
}

impl<T: DistributionFitter + ?Sized> DistributionFitter for &T {
    fn fit(&self, sample: &[f64]) -> Result<BetaFit, StatisticError> {
        (**self).fit(sample)
    }
}

impl<T: DistributionFitter + ?Sized> DistributionFitter for Box<T> {
    fn fit(&self, sample: &[f64]) -> Result<BetaFit, StatisticError> {
        (**self).fit(sample)
    }
}

/// Which fitter a run uses; parsed from the `[statistics] fitter` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitterKind {
    #[default]
    Mle,
    Normalized,
}

impl FitterKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mle" => Some(Self::Mle),
            "normalized" | "normalised" => Some(Self::Normalized),
            _ => None,
        }
    }

    pub fn build(self) -> Box<dyn DistributionFitter + Send + Sync> {
        match self {
            Self::Mle => Box::new(BetaMleFitter::default()),
            Self::Normalized => Box::new(NormalizedBetaFitter::default()),
        }
    }
}

/// Maximum-likelihood fit of all four parameters over the raw sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetaMleFitter {
    pub options: SimplexOptions,
}

impl DistributionFitter for BetaMleFitter {
    fn fit(&self, sample: &[f64]) -> Result<BetaFit, StatisticError> {
        if sample.is_empty() {
            return Err(StatisticError::EmptyInput { statistic: "beta" });
        }

        let start = fit_start(sample);
        let x0 = [start.alpha, start.beta, start.loc, start.scale];
        let min = nelder_mead(
            |p| penalized_nll(p[0], p[1], p[2], p[3], sample),
            &x0,
            self.options,
        );
        tracing::debug!(
            n = sample.len(),
            iterations = min.iterations,
            converged = min.converged,
            nll = min.value,
            "beta mle fit"
        );

        let fit = BetaFit {
            alpha: min.x[0],
            beta: min.x[1],
            loc: min.x[2],
            scale: min.x[3],
        };
        if !fit.is_valid() {
            return Err(StatisticError::FitDiverged {
                statistic: "beta",
                reason: format!(
                    "alpha={}, beta={}, scale={}",
                    fit.alpha, fit.beta, fit.scale
                ),
            });
        }
        Ok(fit)
    }
}

/// Shape-only fit over the sample mapped into (0, 1).
///
/// The support is the sample range widened by 10% on each side, so every
/// observation lands strictly inside the unit interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedBetaFitter {
    pub options: SimplexOptions,
}

impl DistributionFitter for NormalizedBetaFitter {
    fn fit(&self, sample: &[f64]) -> Result<BetaFit, StatisticError> {
        if sample.is_empty() {
            return Err(StatisticError::EmptyInput { statistic: "beta" });
        }

        let (lo, hi) = min_max(sample);
        let width = hi - lo;
        if width <= 0.0 {
            return Err(StatisticError::FitDiverged {
                statistic: "beta",
                reason: "sample has no spread to normalize".into(),
            });
        }
        let loc = lo - SUPPORT_MARGIN * width;
        let scale = width * (1.0 + 2.0 * SUPPORT_MARGIN);
        let unit: Vec<f64> = sample.iter().map(|x| (x - loc) / scale).collect();

        let (a0, b0) = moment_shapes(&unit).unwrap_or((1.0, 1.0));
        let min = nelder_mead(
            |p| penalized_nll(p[0], p[1], 0.0, 1.0, &unit),
            &[a0, b0],
            self.options,
        );

        let fit = BetaFit {
            alpha: min.x[0],
            beta: min.x[1],
            loc,
            scale,
        };
        if !fit.is_valid() {
            return Err(StatisticError::FitDiverged {
                statistic: "beta",
                reason: format!("alpha={}, beta={}", fit.alpha, fit.beta),
            });
        }
        Ok(fit)
    }
}

/// Shape estimate of the default [`BetaMleFitter`].
pub fn fit_beta_shape(returns: &[f64]) -> Result<f64, StatisticError> {
    BetaMleFitter::default().fit_beta_shape(returns)
}

/// Log-density of the standard Beta(a, b) on [0, 1].
///
/// Zero-weight terms vanish at the boundary (`0 * ln 0 = 0`), so
/// `Beta(1, b)` at 0 and `Beta(a, 1)` at 1 stay finite.
pub fn beta_log_pdf(z: f64, a: f64, b: f64) -> f64 {
    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    xlogy(a - 1.0, z) + xlogy(b - 1.0, 1.0 - z) - ln_beta
}

fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 && !y.is_nan() {
        0.0
    } else {
        x * y.ln()
    }
}

fn penalized_nll(a: f64, b: f64, loc: f64, scale: f64, sample: &[f64]) -> f64 {
    if !(a > 0.0 && b > 0.0 && scale > 0.0) || !loc.is_finite() || !scale.is_finite() {
        return f64::INFINITY;
    }

    let mut log_lik = 0.0;
    let mut unusable = 0usize;
    for &x in sample {
        let z = (x - loc) / scale;
        if !(0.0..=1.0).contains(&z) {
            unusable += 1;
            continue;
        }
        let lp = beta_log_pdf(z, a, b);
        if lp.is_finite() {
            log_lik += lp;
        } else {
            unusable += 1;
        }
    }

    let penalty = unusable as f64 * LN_F64_MAX * 100.0;
    -log_lik + penalty + sample.len() as f64 * scale.ln()
}

/// Starting point for the four-parameter search: shapes matched to the
/// sample's skewness and kurtosis, then location and scale.
pub fn fit_start(sample: &[f64]) -> BetaFit {
    let (alpha, beta) = match sample_skew_kurtosis(sample) {
        Some((skew, kurt)) => shapes_from_skew_kurtosis(skew, kurt),
        None => (1.0, 1.0),
    };
    let (loc, scale) = start_loc_scale(sample, alpha, beta);
    BetaFit {
        alpha,
        beta,
        loc,
        scale,
    }
}

/// Biased sample skewness and excess kurtosis; `None` for a sample with no
/// spread.
fn sample_skew_kurtosis(sample: &[f64]) -> Option<(f64, f64)> {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in sample {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let skew = m3 / m2.powf(1.5);
    let kurt = m4 / (m2 * m2) - 3.0;
    (skew.is_finite() && kurt.is_finite()).then_some((skew, kurt))
}

fn beta_skew_kurtosis(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let skew = 2.0 * (b - a) * (s + 1.0).sqrt() / (s + 2.0) / (a * b).sqrt();
    let mut kurt = a.powi(3) - a * a * (2.0 * b - 1.0) + b * b * (b + 1.0) - 2.0 * a * b * (b + 2.0);
    kurt /= a * b * (s + 2.0) * (s + 3.0);
    (skew, 6.0 * kurt)
}

/// Solve for the (a, b) whose theoretical skewness and excess kurtosis
/// match the targets, starting from (1, 1).
///
/// Works on (ln a, ln b) with a damped Newton step so both shapes stay
/// positive. When no beta attains the targets (heavy tails do not fit the
/// family), the closest point found is returned.
pub fn shapes_from_skew_kurtosis(skew: f64, kurt: f64) -> (f64, f64) {
    let residual = |u: [f64; 2]| {
        let (s, k) = beta_skew_kurtosis(u[0].exp(), u[1].exp());
        [s - skew, k - kurt]
    };
    let norm = |r: [f64; 2]| r[0].hypot(r[1]);

    let mut u = [0.0_f64, 0.0_f64];
    let mut r = residual(u);
    for _ in 0..MOMENT_SOLVE_MAX_ITER {
        if !(norm(r) > MOMENT_SOLVE_TOL) {
            break;
        }

        let h = 1e-6;
        let mut jac = [[0.0; 2]; 2];
        for j in 0..2 {
            let mut up = u;
            let mut down = u;
            up[j] += h;
            down[j] -= h;
            let (rp, rm) = (residual(up), residual(down));
            jac[0][j] = (rp[0] - rm[0]) / (2.0 * h);
            jac[1][j] = (rp[1] - rm[1]) / (2.0 * h);
        }
        let det = jac[0][0] * jac[1][1] - jac[0][1] * jac[1][0];
        if !det.is_finite() || det.abs() < 1e-300 {
            break;
        }
        let step = [
            -(jac[1][1] * r[0] - jac[0][1] * r[1]) / det,
            -(-jac[1][0] * r[0] + jac[0][0] * r[1]) / det,
        ];

        let mut t = 1.0;
        let mut accepted = false;
        while t > 1e-6 {
            let candidate = [
                (u[0] + t * step[0]).clamp(LN_SHAPE_MIN, LN_SHAPE_MAX),
                (u[1] + t * step[1]).clamp(LN_SHAPE_MIN, LN_SHAPE_MAX),
            ];
            let rc = residual(candidate);
            if norm(rc) < norm(r) {
                u = candidate;
                r = rc;
                accepted = true;
                break;
            }
            t *= 0.5;
        }
        if !accepted {
            tracing::debug!(skew, kurt, residual = norm(r), "moment match stalled");
            break;
        }
    }

    (u[0].exp(), u[1].exp())
}

/// Location and scale for given shapes: method of moments when that
/// support strictly covers the sample, otherwise the sample range widened
/// by 10% on each side.
fn start_loc_scale(sample: &[f64], a: f64, b: f64) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let var = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    let s = a + b;
    let dist_mean = a / s;
    let dist_var = a * b / (s * s * (s + 1.0));

    let mut scale = (var / dist_var).sqrt();
    let mut loc = mean - scale * dist_mean;
    if !loc.is_finite() {
        loc = 0.0;
    }
    if !(scale.is_finite() && scale > 0.0) {
        scale = 1.0;
    }

    let (lo, hi) = min_max(sample);
    if loc < lo && hi < loc + scale {
        return (loc, scale);
    }

    let width = hi - lo;
    let margin = width * SUPPORT_MARGIN;
    (lo - margin, width + 2.0 * margin)
}

/// Method-of-moments shapes for a sample already on (0, 1).
fn moment_shapes(unit: &[f64]) -> Option<(f64, f64)> {
    let n = unit.len() as f64;
    let mean = unit.iter().sum::<f64>() / n;
    let var = unit.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let common = mean * (1.0 - mean) / var - 1.0;
    let (a, b) = (mean * common, (1.0 - mean) * common);
    (a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0).then_some((a, b))
}

fn min_max(sample: &[f64]) -> (f64, f64) {
    sample
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use statrs::distribution::{Beta, ContinuousCDF};

    /// Evenly spaced quantiles of Beta(a, b), mapped through loc/scale.
    fn beta_quantiles(a: f64, b: f64, loc: f64, scale: f64, n: usize) -> Vec<f64> {
        let dist = Beta::new(a, b).unwrap();
        (0..n)
            .map(|i| loc + scale * dist.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect()
    }

    fn nll(fit: &BetaFit, sample: &[f64]) -> f64 {
        penalized_nll(fit.alpha, fit.beta, fit.loc, fit.scale, sample)
    }

    fn sample_returns() -> Vec<f64> {
        vec![
            0.012, -0.004, 0.007, -0.015, 0.003, 0.021, -0.009, 0.001, -0.002, 0.011, -0.018,
            0.006, 0.004, -0.007, 0.015, -0.001, 0.009, -0.012, 0.002, 0.005,
        ]
    }

    #[test]
    fn log_pdf_of_uniform_is_zero() {
        assert_abs_diff_eq!(beta_log_pdf(0.3, 1.0, 1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(beta_log_pdf(0.0, 1.0, 1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn log_pdf_matches_closed_form() {
        // Beta(2, 2) density is 6 z (1 - z).
        let z: f64 = 0.25;
        assert_relative_eq!(
            beta_log_pdf(z, 2.0, 2.0),
            (6.0 * z * (1.0 - z)).ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn moment_match_recovers_shapes() {
        let (skew, kurt) = beta_skew_kurtosis(2.0, 5.0);
        let (a, b) = shapes_from_skew_kurtosis(skew, kurt);
        assert_relative_eq!(a, 2.0, epsilon = 1e-4);
        assert_relative_eq!(b, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn moment_match_of_symmetric_flat_sample_stays_near_one() {
        let (skew, kurt) = beta_skew_kurtosis(1.0, 1.0);
        let (a, b) = shapes_from_skew_kurtosis(skew, kurt);
        assert_relative_eq!(a, 1.0, epsilon = 1e-6);
        assert_relative_eq!(b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn moment_match_unattainable_target_stays_positive() {
        // Excess kurtosis far above anything a beta reaches for this skew.
        let (a, b) = shapes_from_skew_kurtosis(0.0, 25.0);
        assert!(a > 0.0 && a.is_finite());
        assert!(b > 0.0 && b.is_finite());
    }

    #[test]
    fn fit_start_covers_sample() {
        let sample = sample_returns();
        let start = fit_start(&sample);
        let (lo, hi) = min_max(&sample);
        assert!(start.loc < lo);
        assert!(start.loc + start.scale > hi);
        assert!(nll(&start, &sample).is_finite());
    }

    #[test]
    fn penalized_nll_rejects_invalid_parameters() {
        let sample = [0.1, 0.2];
        assert_eq!(penalized_nll(-1.0, 2.0, 0.0, 1.0, &sample), f64::INFINITY);
        assert_eq!(penalized_nll(1.0, 0.0, 0.0, 1.0, &sample), f64::INFINITY);
        assert_eq!(penalized_nll(1.0, 2.0, 0.0, 0.0, &sample), f64::INFINITY);
    }

    #[test]
    fn penalized_nll_charges_points_outside_support() {
        let inside = penalized_nll(1.0, 1.0, 0.0, 1.0, &[0.5]);
        let outside = penalized_nll(1.0, 1.0, 0.0, 1.0, &[1.5]);
        assert_abs_diff_eq!(inside, 0.0, epsilon = 1e-12);
        assert_relative_eq!(outside, LN_F64_MAX * 100.0);
    }

    #[test]
    fn mle_fit_improves_on_start() {
        let sample = sample_returns();
        let fit = BetaMleFitter::default().fit(&sample).unwrap();
        assert!(fit.alpha > 0.0 && fit.alpha.is_finite());
        assert!(nll(&fit, &sample) <= nll(&fit_start(&sample), &sample));
    }

    #[test]
    fn mle_fit_accepts_signed_returns_without_rescaling() {
        let sample = sample_returns();
        let fit = BetaMleFitter::default().fit(&sample).unwrap();
        // Location sits below the most negative return: the sample is fitted
        // as-is, not clipped into [0, 1].
        assert!(fit.loc < 0.0);
        assert!(fit.scale < 1.0);
    }

    #[test]
    fn mle_fit_recovers_known_shape() {
        let sample = beta_quantiles(2.0, 5.0, -0.05, 0.1, 200);
        let fit = BetaMleFitter::default().fit(&sample).unwrap();
        assert!((fit.alpha - 2.0).abs() < 0.5, "alpha = {}", fit.alpha);
        assert!((fit.beta - 5.0).abs() < 1.5, "beta = {}", fit.beta);
        assert!((fit.loc + 0.05).abs() < 0.01, "loc = {}", fit.loc);
    }

    #[test]
    fn mle_fit_is_deterministic() {
        let sample = sample_returns();
        let first = BetaMleFitter::default().fit(&sample).unwrap();
        let second = BetaMleFitter::default().fit(&sample).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mle_fit_without_finite_support_diverges() {
        // An infinite observation leaves no finite location or scale to start from.
        let err = BetaMleFitter::default()
            .fit(&[f64::INFINITY, 0.0])
            .unwrap_err();
        match err {
            StatisticError::FitDiverged { statistic, reason } => {
                assert_eq!(statistic, "beta");
                assert!(reason.contains("scale="), "reason = {reason}");
            }
            other => panic!("expected FitDiverged, got {other:?}"),
        }
    }

    #[test]
    fn mle_fit_of_three_returns_is_pinned() {
        let fit = BetaMleFitter::default().fit(&[0.10, -0.10, -0.09]).unwrap();
        assert_abs_diff_eq!(fit.alpha, 0.004_248_2, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.loc, -0.115_95, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.scale, 0.215_95, epsilon = 1e-4);
    }

    #[test]
    fn empty_sample_is_empty_input() {
        let err = BetaMleFitter::default().fit(&[]).unwrap_err();
        assert!(matches!(err, StatisticError::EmptyInput { .. }));
        let err = NormalizedBetaFitter::default().fit_beta_shape(&[]).unwrap_err();
        assert!(matches!(err, StatisticError::EmptyInput { .. }));
        assert!(fit_beta_shape(&[]).is_err());
    }

    #[test]
    fn normalized_fit_recovers_shape_order() {
        // Right-skewed sample: alpha below beta.
        let sample = beta_quantiles(2.0, 5.0, -0.05, 0.1, 200);
        let fit = NormalizedBetaFitter::default().fit(&sample).unwrap();
        assert!(fit.alpha > 0.0);
        assert!(fit.alpha < fit.beta);
        let (lo, hi) = min_max(&sample);
        assert!(fit.loc < lo && fit.loc + fit.scale > hi);
    }

    #[test]
    fn normalized_fit_rejects_constant_sample() {
        let err = NormalizedBetaFitter::default()
            .fit(&[0.01, 0.01, 0.01])
            .unwrap_err();
        assert!(matches!(err, StatisticError::FitDiverged { .. }));
    }

    #[test]
    fn fitter_kind_parses_config_values() {
        assert_eq!(FitterKind::parse("mle"), Some(FitterKind::Mle));
        assert_eq!(FitterKind::parse(" Normalized "), Some(FitterKind::Normalized));
        assert_eq!(FitterKind::parse("moments"), None);
    }

    #[test]
    fn boxed_fitter_delegates() {
        let fitter = FitterKind::Mle.build();
        let sample = sample_returns();
        assert_eq!(
            fitter.fit_beta_shape(&sample).unwrap(),
            fit_beta_shape(&sample).unwrap()
        );
    }
}
