//! Configuration validation.
//!
//! Checks every config field an evaluation needs before any data is read.

use crate::domain::distribution::FitterKind;
use crate::domain::error::BackstatError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BackstatError> {
    validate_required("data", "path", config)?;
    validate_required("data", "code", config)?;
    validate_required("data", "exchange", config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BackstatError> {
    let kind = config
        .get_string("strategy", "kind")
        .unwrap_or_else(|| "sma_trend".to_string());
    match kind.trim().to_lowercase().as_str() {
        "sma_trend" => validate_period(config),
        "buy_and_hold" => Ok(()),
        other => Err(BackstatError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "kind".to_string(),
            reason: format!("unknown strategy '{other}' (expected sma_trend or buy_and_hold)"),
        }),
    }
}

pub fn validate_statistics_config(config: &dyn ConfigPort) -> Result<(), BackstatError> {
    match config.get_string("statistics", "fitter") {
        None => Ok(()),
        Some(s) if FitterKind::parse(&s).is_some() => Ok(()),
        Some(s) => Err(BackstatError::ConfigInvalid {
            section: "statistics".to_string(),
            key: "fitter".to_string(),
            reason: format!("unknown fitter '{}' (expected mle or normalized)", s.trim()),
        }),
    }
}

fn validate_required(section: &str, key: &str, config: &dyn ConfigPort) -> Result<(), BackstatError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(BackstatError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BackstatError> {
    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(BackstatError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

/// Parse a `[data]` date value in `YYYY-MM-DD` form.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BackstatError> {
    match value {
        None => Err(BackstatError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
            BackstatError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), BackstatError> {
    let value = parse_number::<i64>(config, "strategy", "period", "an integer")?.unwrap_or(50);
    if value < 1 {
        return Err(BackstatError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "period".to_string(),
            reason: "period must be at least 1".to_string(),
        });
    }
    parse_number::<f64>(config, "strategy", "long", "a number")?;
    parse_number::<f64>(config, "strategy", "short", "a number")?;
    Ok(())
}

/// A present value must parse; an absent one is left to the caller's default.
fn parse_number<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, BackstatError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| BackstatError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not {expected}", raw.trim()),
        }),
    }
}
