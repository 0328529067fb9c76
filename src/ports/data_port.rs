//! Price history source port trait.

use crate::domain::error::BackstatError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` on `exchange` within the closed range
    /// `[start_date, end_date]`, in date order.
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BackstatError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, BackstatError>;

    /// First date, last date and bar count, or `None` when there is no data.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BackstatError>;
}
