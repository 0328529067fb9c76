//! CSV file price data adapter.
//!
//! One file per symbol, `<base>/<CODE>_<EXCHANGE>.csv`, with a header row
//! and columns `date,open,high,low,close,volume`.

use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::BackstatError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }

    fn read_all(&self, code: &str, exchange: &str) -> Result<Vec<OhlcvBar>, BackstatError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path).map_err(|e| BackstatError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| BackstatError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = row + 2;

            let date_str = field(&record, 0, line)?;
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                BackstatError::DataSource {
                    reason: format!("line {line}: invalid date '{date_str}': {e}"),
                }
            })?;

            bars.push(OhlcvBar {
                code: code.to_string(),
                exchange: exchange.to_string(),
                date,
                open: number(&record, 1, line)?,
                high: number(&record, 2, line)?,
                low: number(&record, 3, line)?,
                close: number(&record, 4, line)?,
                volume: number(&record, 5, line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, line: usize) -> Result<&'r str, BackstatError> {
    record.get(idx).ok_or_else(|| BackstatError::DataSource {
        reason: format!("line {line}: missing {} column", COLUMNS[idx]),
    })
}

fn number(record: &csv::StringRecord, idx: usize, line: usize) -> Result<f64, BackstatError> {
    let raw = field(record, idx, line)?;
    raw.parse().map_err(|e| BackstatError::DataSource {
        reason: format!("line {line}: invalid {} value '{raw}': {e}", COLUMNS[idx]),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BackstatError> {
        let mut bars = self.read_all(code, exchange)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        tracing::debug!(code, exchange, bars = bars.len(), "loaded csv bars");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, BackstatError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BackstatError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| BackstatError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(&suffix) {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BackstatError> {
        if !self.csv_path(code, exchange).exists() {
            return Ok(None);
        }
        let bars = self.read_all(code, exchange)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
