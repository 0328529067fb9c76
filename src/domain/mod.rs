//! Core domain types and the statistics pipeline.

pub mod ohlcv;
pub mod position;
pub mod strategy;
pub mod indicator;
pub mod returns;
pub mod optimize;
pub mod distribution;
pub mod drawdown;
pub mod report;
pub mod config_validation;
pub mod error;
