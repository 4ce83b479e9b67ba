//! Configuration validation.
//!
//! Checks every section before a run. Present values that fail to parse are
//! rejected rather than replaced by their default.

use crate::domain::error::ScreenerError;
use crate::domain::strategy::VariantKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{BarInterval, Lookback};

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_data(config)?;
    validate_strategy(config)?;
    validate_backtest(config)?;
    validate_screening(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn raw_value(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ScreenerError> {
    match raw_value(config, section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not an integer"))),
    }
}

pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    match raw_value(config, section, key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(section, key, format!("'{raw}' is not a number"))),
        },
    }
}

/// A lookback window: integer >= 1.
pub fn read_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenerError> {
    let value = read_int(config, section, key, default as i64)?;
    if value < 1 {
        return Err(invalid(section, key, format!("{key} must be positive")));
    }
    Ok(value as usize)
}

pub fn read_lookback(config: &dyn ConfigPort) -> Result<Lookback, ScreenerError> {
    config
        .get_string_or("data", "period", "1y")
        .parse()
        .map_err(|e: ScreenerError| invalid("data", "period", reason_of(e)))
}

pub fn read_interval(config: &dyn ConfigPort) -> Result<BarInterval, ScreenerError> {
    config
        .get_string_or("data", "interval", "1d")
        .parse()
        .map_err(|e: ScreenerError| invalid("data", "interval", reason_of(e)))
}

pub fn read_variant_kind(config: &dyn ConfigPort) -> Result<VariantKind, ScreenerError> {
    config
        .get_string_or("strategy", "variant", "ma_crossover")
        .parse()
        .map_err(|e: ScreenerError| invalid("strategy", "variant", reason_of(e)))
}

fn reason_of(err: ScreenerError) -> String {
    match err {
        ScreenerError::InvalidParameter { reason, .. } => reason,
        other => other.to_string(),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    read_lookback(config)?;
    read_interval(config)?;
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    match read_variant_kind(config)? {
        VariantKind::MaCrossover => {
            let short = read_window(config, "strategy", "short_window", 5)?;
            let long = read_window(config, "strategy", "long_window", 25)?;
            if short >= long {
                return Err(invalid(
                    "strategy",
                    "short_window",
                    "short_window must be below long_window",
                ));
            }
        }
        VariantKind::Rsi => {
            read_window(config, "strategy", "rsi_period", 14)?;
            let oversold = read_double(config, "strategy", "oversold", 30.0)?;
            let overbought = read_double(config, "strategy", "overbought", 70.0)?;
            for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(invalid(
                        "strategy",
                        key,
                        format!("{key} must be between 0 and 100"),
                    ));
                }
            }
            if oversold >= overbought {
                return Err(invalid(
                    "strategy",
                    "oversold",
                    "oversold must be below overbought",
                ));
            }
        }
        VariantKind::Bollinger => {
            let period = read_window(config, "strategy", "bb_period", 20)?;
            if period < 2 {
                return Err(invalid("strategy", "bb_period", "bb_period must be at least 2"));
            }
            let k = read_double(config, "strategy", "bb_std", 2.0)?;
            if k <= 0.0 {
                return Err(invalid("strategy", "bb_std", "bb_std must be positive"));
            }
        }
        VariantKind::Macd => {
            let fast = read_window(config, "strategy", "macd_fast", 12)?;
            let slow = read_window(config, "strategy", "macd_slow", 26)?;
            read_window(config, "strategy", "macd_signal", 9)?;
            if fast >= slow {
                return Err(invalid(
                    "strategy",
                    "macd_fast",
                    "macd_fast must be below macd_slow",
                ));
            }
        }
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let capital = read_double(config, "backtest", "initial_capital", 1_000_000.0)?;
    if capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let periods = read_int(config, "backtest", "periods_per_year", 252)?;
    if periods < 1 || periods > i64::from(u32::MAX) {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be at least 1",
        ));
    }

    let rf = read_double(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&rf) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_screening(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let win_rate = read_double(config, "screening", "min_win_rate", 40.0)?;
    if !(0.0..=100.0).contains(&win_rate) {
        return Err(invalid(
            "screening",
            "min_win_rate",
            "min_win_rate must be between 0 and 100",
        ));
    }

    read_double(config, "screening", "min_total_return", 0.0)?;

    let max_dd = read_double(config, "screening", "max_drawdown", -30.0)?;
    if max_dd > 0.0 {
        return Err(invalid(
            "screening",
            "max_drawdown",
            "max_drawdown must be zero or negative",
        ));
    }

    let min_trades = read_int(config, "screening", "min_trade_count", 3)?;
    if min_trades < 0 {
        return Err(invalid(
            "screening",
            "min_trade_count",
            "min_trade_count must be non-negative",
        ));
    }

    if let Some(raw) = config.get_string("screening", "parallel") {
        if !matches!(
            raw.trim().to_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "1" | "0"
        ) {
            return Err(invalid("screening", "parallel", "parallel must be a boolean"));
        }
    }
    Ok(())
}
