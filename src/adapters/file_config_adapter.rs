//! INI file configuration adapter backing `ConfigPort`.

use configparser::ini::Ini;
use std::path::Path;

use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
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

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .getbool(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[backtest]
initial_cash = 250000
commission_rate = 0.0005
lot_size = 100

[events]
types = earnings
licenses = standard

[cache]
ttl_seconds = 300
"#;

    #[test]
    fn reads_typed_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_cash", 0.0), 250_000.0);
        assert_eq!(adapter.get_double("backtest", "commission_rate", 0.0), 0.0005);
        assert_eq!(adapter.get_int("backtest", "lot_size", 0), 100);
        assert_eq!(adapter.get_int("cache", "ttl_seconds", 0), 300);
        assert_eq!(
            adapter.get_string("events", "types"),
            Some("earnings".to_string())
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "absent"), None);
        assert_eq!(adapter.get_int("backtest", "absent", 7), 7);
        assert_eq!(adapter.get_double("absent_section", "key", 1.5), 1.5);
        assert!(adapter.get_bool("backtest", "absent", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nlot_size = a_few\n").unwrap();
        assert_eq!(adapter.get_int("backtest", "lot_size", 100), 100);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[backtest]\nslippage_bps = 2\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_double("backtest", "slippage_bps", 0.0), 2.0);
    }

    #[test]
    fn from_file_errors_on_missing_path() {
        assert!(FileConfigAdapter::from_file("/nonexistent/tradesight.ini").is_err());
    }
}
