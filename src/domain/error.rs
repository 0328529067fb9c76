//! Domain error types.

use chrono::NaiveDate;

/// A failure confined to a single statistic of the report.
///
/// These never abort an evaluation: the report stores them next to the
/// statistics that did compute.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatisticError {
    #[error("{statistic}: no samples available")]
    EmptyInput { statistic: &'static str },

    #[error("{statistic}: fit did not converge to valid parameters ({reason})")]
    FitDiverged {
        statistic: &'static str,
        reason: String,
    },
}

/// Top-level error type for backstat.
#[derive(Debug, thiserror::Error)]
pub enum BackstatError {
    #[error("position series misaligned with prices: {reason}")]
    Alignment { reason: String },

    #[error("price bars out of order at index {index} ({date})")]
    UnorderedBars { index: usize, date: NaiveDate },

    #[error(transparent)]
    Statistic(#[from] StatisticError),

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BackstatError> for std::process::ExitCode {
    fn from(err: &BackstatError) -> Self {
        let code: u8 = match err {
            BackstatError::Io(_) => 1,
            BackstatError::ConfigParse { .. }
            | BackstatError::ConfigMissing { .. }
            | BackstatError::ConfigInvalid { .. } => 2,
            BackstatError::DataSource { .. } => 3,
            BackstatError::Alignment { .. } | BackstatError::UnorderedBars { .. } => 4,
            BackstatError::NoData { .. } => 5,
            BackstatError::Statistic(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
