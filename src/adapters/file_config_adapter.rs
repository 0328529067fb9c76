//! INI file configuration adapter.

use crate::domain::error::BackstatError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BackstatError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| BackstatError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, BackstatError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| BackstatError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[data]
path = ./data
code = BHP
exchange = ASX
start_date = 2020-01-01
end_date = 2024-12-31

[strategy]
kind = sma_trend
period = 50
long = 1.0
short = -0.5

[statistics]
fitter = mle

[report]
output = report.csv
"#;

    #[test]
    fn reads_every_section() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();
        assert_eq!(adapter.get_string("data", "code"), Some("BHP".to_string()));
        assert_eq!(adapter.get_string("strategy", "kind"), Some("sma_trend".to_string()));
        assert_eq!(adapter.get_int("strategy", "period", 0), 50);
        assert_eq!(adapter.get_double("strategy", "short", 0.0), -0.5);
        assert_eq!(adapter.get_string("statistics", "fitter"), Some("mle".to_string()));
        assert_eq!(
            adapter.get_string("report", "output"),
            Some("report.csv".to_string())
        );
    }

    #[test]
    fn missing_values_fall_back() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nperiod = abc\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("strategy", "period", 42), 42);
        assert_eq!(adapter.get_double("strategy", "long", 1.5), 1.5);
    }

    #[test]
    fn get_date_reads_data_section() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();
        assert_eq!(
            adapter.get_date("start_date").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        let err = adapter.get_date("as_of").unwrap_err();
        assert!(matches!(err, BackstatError::ConfigMissing { key, .. } if key == "as_of"));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[report]\noutput = /tmp/out.txt\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output"),
            Some("/tmp/out.txt".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/backstat.ini");
        match result {
            Err(BackstatError::ConfigParse { file, .. }) => {
                assert!(file.ends_with("backstat.ini"))
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
