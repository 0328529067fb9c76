//! Configuration access port trait.

use crate::domain::config_validation::parse_date;
use crate::domain::error::BackstatError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// A `YYYY-MM-DD` value from the `[data]` section.
    fn get_date(&self, key: &str) -> Result<NaiveDate, BackstatError> {
        parse_date(self.get_string("data", key).as_deref(), key)
    }
}
