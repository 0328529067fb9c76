//! Cumulative-return curve as CSV, implementing ReportPort.
//!
//! Rows are `date,return,cumulative_return,drawdown`, one per usable
//! return, ready for charting elsewhere.

use crate::domain::drawdown::{cumulative_returns, drawdown_curve};
use crate::domain::error::BackstatError;
use crate::domain::report::Evaluation;
use crate::ports::report_port::ReportPort;

pub struct CurveCsvAdapter;

impl ReportPort for CurveCsvAdapter {
    fn render(&self, evaluation: &Evaluation, _label: &str) -> Result<String, BackstatError> {
        let values = evaluation.returns.values();
        let cumulative = cumulative_returns(&values);
        let drawdown = drawdown_curve(&values);

        let csv_err = |e: csv::Error| BackstatError::Io(std::io::Error::other(e));
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["date", "return", "cumulative_return", "drawdown"])
            .map_err(csv_err)?;
        for ((point, cum), dd) in evaluation.returns.points.iter().zip(&cumulative).zip(&drawdown) {
            wtr.write_record([
                point.date.to_string(),
                point.value.to_string(),
                cum.to_string(),
                dd.to_string(),
            ])
            .map_err(csv_err)?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| BackstatError::Io(std::io::Error::other(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| BackstatError::Io(std::io::Error::other(e)))
    }
}
