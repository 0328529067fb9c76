//! Plain-text statistics summary implementing ReportPort.

use crate::domain::distribution::BetaFit;
use crate::domain::error::{BackstatError, StatisticError};
use crate::domain::report::Evaluation;
use crate::ports::report_port::ReportPort;
use std::fmt::Write;

pub struct TextReportAdapter;

fn shape(fit: &Result<BetaFit, StatisticError>) -> String {
    match fit {
        Ok(fit) => format!("{:.6}", fit.alpha),
        Err(StatisticError::EmptyInput { .. }) => "undefined (no samples)".to_string(),
        Err(StatisticError::FitDiverged { reason, .. }) => format!("undefined ({reason})"),
    }
}

fn number(value: f64) -> String {
    if value.is_nan() {
        "undefined".to_string()
    } else {
        format!("{value:.6}")
    }
}

impl ReportPort for TextReportAdapter {
    fn render(&self, evaluation: &Evaluation, label: &str) -> Result<String, BackstatError> {
        let report = &evaluation.report;
        let mut out = String::new();

        let period = match (evaluation.returns.points.first(), evaluation.returns.points.last()) {
            (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
            _ => "no usable returns".to_string(),
        };

        let fmt_err = |e: std::fmt::Error| BackstatError::Io(std::io::Error::other(e));
        writeln!(out, "=== {label} ({}) ===", evaluation.strategy).map_err(fmt_err)?;
        writeln!(out, "Period:           {period}").map_err(fmt_err)?;
        writeln!(out, "Observations:     {}", report.observations).map_err(fmt_err)?;
        writeln!(out, "Discarded:        {}", report.discarded).map_err(fmt_err)?;
        writeln!(out, "Mean Return:      {}", number(report.mean)).map_err(fmt_err)?;
        writeln!(out, "Variance:         {}", number(report.variance)).map_err(fmt_err)?;
        writeln!(out, "Beta:             {}", shape(&report.beta)).map_err(fmt_err)?;
        writeln!(out, "Downside Beta:    {}", shape(&report.downside_beta)).map_err(fmt_err)?;
        writeln!(out, "Max Drawdown:     {:.2}%", report.max_drawdown * 100.0).map_err(fmt_err)?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::StatisticsReport;
    use crate::domain::returns::{ReturnPoint, ReturnSeries};
    use chrono::NaiveDate;

    fn evaluation(beta: Result<BetaFit, StatisticError>, mean: f64) -> Evaluation {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        Evaluation {
            strategy: "sma_trend".into(),
            report: StatisticsReport {
                observations: 1,
                discarded: 2,
                mean,
                variance: f64::NAN,
                beta,
                downside_beta: Err(StatisticError::EmptyInput {
                    statistic: "downside_beta",
                }),
                max_drawdown: -0.1234,
            },
            returns: ReturnSeries {
                points: vec![ReturnPoint { date, value: 0.01 }],
                discarded: 2,
            },
        }
    }

    #[test]
    fn renders_every_statistic() {
        let fit = BetaFit {
            alpha: 1.5,
            beta: 2.0,
            loc: -0.1,
            scale: 0.2,
        };
        let text = TextReportAdapter
            .render(&evaluation(Ok(fit), 0.01), "BHP.ASX")
            .unwrap();

        assert!(text.starts_with("=== BHP.ASX (sma_trend) ==="));
        assert!(text.contains("Period:           2024-05-02 to 2024-05-02"));
        assert!(text.contains("Discarded:        2"));
        assert!(text.contains("Mean Return:      0.010000"));
        assert!(text.contains("Variance:         undefined"));
        assert!(text.contains("Beta:             1.500000"));
        assert!(text.contains("Downside Beta:    undefined (no samples)"));
        assert!(text.contains("Max Drawdown:     -12.34%"));
    }

    #[test]
    fn renders_diverged_fit_reason() {
        let err = StatisticError::FitDiverged {
            statistic: "beta",
            reason: "alpha=-1".into(),
        };
        let text = TextReportAdapter
            .render(&evaluation(Err(err), 0.0), "X")
            .unwrap();
        assert!(text.contains("Beta:             undefined (alpha=-1)"));
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("summary.txt");
        TextReportAdapter
            .write(&evaluation(Err(StatisticError::EmptyInput { statistic: "beta" }), 0.0), "X", &path)
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Observations:     1"));
    }
}
