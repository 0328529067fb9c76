//! Port traits connecting the domain to data, configuration and reporting.

pub mod config_port;
pub mod data_port;
pub mod report_port;
