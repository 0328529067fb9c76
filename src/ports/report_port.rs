//! Report output port trait.

use crate::domain::error::BackstatError;
use crate::domain::report::Evaluation;
use std::path::Path;

/// Port for presenting an evaluation.
pub trait ReportPort {
    fn render(&self, evaluation: &Evaluation, label: &str) -> Result<String, BackstatError>;

    /// Default implementation: renders and writes the result to `output_path`.
    fn write(
        &self,
        evaluation: &Evaluation,
        label: &str,
        output_path: &Path,
    ) -> Result<(), BackstatError> {
        let content = self.render(evaluation, label)?;
        std::fs::write(output_path, content)?;
        Ok(())
    }
}
