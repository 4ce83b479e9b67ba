//! INI file configuration adapter.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ScreenerError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScreenerError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScreenerError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[data]
dir = /var/lib/prices
period = 2y

[strategy]
variant = rsi
rsi_period = 10

[screening]
sectors = Banks, Retail
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "dir"),
            Some("/var/lib/prices".to_string())
        );
        assert_eq!(adapter.get_string("strategy", "variant"), Some("rsi".to_string()));
        assert_eq!(adapter.get_string("strategy", "rsi_period"), Some("10".to_string()));
        assert_eq!(
            adapter.get_string("screening", "sectors"),
            Some("Banks, Retail".to_string())
        );
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert!(adapter.get_bool("screening", "parallel", true));
    }

    #[test]
    fn invalid_bool_falls_back() {
        let adapter = FileConfigAdapter::from_string("[screening]\nparallel = maybe\n").unwrap();
        assert!(adapter.get_bool("screening", "parallel", true));
        assert!(!adapter.get_bool("screening", "parallel", false));
    }

    #[test]
    fn parses_bools() {
        let adapter = FileConfigAdapter::from_string(
            "[screening]\nmax_drawdown = -25.5\nparallel = no\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_string("screening", "max_drawdown"),
            Some("-25.5".to_string())
        );
        assert!(!adapter.get_bool("screening", "parallel", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[universe]\nfile = /etc/universe.csv\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("universe", "file"),
            Some("/etc/universe.csv".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ScreenerError::ConfigParse { .. })));
    }
}
