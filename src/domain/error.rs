//! Domain error types.

/// Top-level error type for stockscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("no usable price data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("insufficient history for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown sector: {0}")]
    UnknownSector(String),

    #[error("no instrument could be analysed")]
    NoResults,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        ScreenerError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that only affect a single instrument.
    pub fn is_per_instrument(&self) -> bool {
        matches!(
            self,
            ScreenerError::DataUnavailable { .. } | ScreenerError::InsufficientHistory { .. }
        )
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Csv(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. }
            | ScreenerError::InvalidParameter { .. }
            | ScreenerError::UnknownSector(_) => 2,
            ScreenerError::DataUnavailable { .. }
            | ScreenerError::InsufficientHistory { .. }
            | ScreenerError::NoResults => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message() {
        let err = ScreenerError::InsufficientHistory {
            ticker: "7203.T".into(),
            bars: 10,
            minimum: 25,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for 7203.T: have 10 bars, need 25"
        );
    }

    #[test]
    fn per_instrument_classification() {
        let data = ScreenerError::DataUnavailable {
            ticker: "X".into(),
            reason: "missing".into(),
        };
        assert!(data.is_per_instrument());
        assert!(!ScreenerError::invalid_parameter("short_window", "must be positive")
            .is_per_instrument());
        assert!(!ScreenerError::NoResults.is_per_instrument());
    }

    #[test]
    fn invalid_parameter_message() {
        let err = ScreenerError::invalid_parameter("bb_std", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter bb_std: must be positive");
    }
}
