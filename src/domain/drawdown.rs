//! Compounded equity curve and peak-to-trough drawdown.

/// Equity after each return, compounding from a starting value of 1.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect()
}

/// Compounded return to date, `equity - 1`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    equity_curve(returns).into_iter().map(|e| e - 1.0).collect()
}

/// Drawdown at each point, `equity / running_peak - 1`; never positive.
pub fn drawdown_curve(returns: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity_curve(returns)
        .into_iter()
        .map(|equity| {
            peak = peak.max(equity);
            equity / peak - 1.0
        })
        .collect()
}

/// Deepest drawdown of the compounded equity curve, `0.0` when the curve
/// never falls below a previous peak (including the empty series).
///
/// NaN points of the curve are skipped. They only arise once equity has hit
/// zero at the running peak (`0 / 0`), so a series that wipes out on its
/// first return reports `0.0`.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    drawdown_curve(returns).into_iter().fold(0.0_f64, f64::min)
}
