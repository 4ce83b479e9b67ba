//! Configuration access port trait.

use crate::domain::error::ScreenerError;

/// Sectioned key/value configuration. Numeric keys are read through
/// `config_validation::read_int` and `read_double`, which reject values that
/// do not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Non-empty string value or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, ScreenerError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(ScreenerError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}
