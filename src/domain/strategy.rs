//! Strategy variants and their parameters.

use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::{bollinger, macd};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SHORT_WINDOW: usize = 5;
pub const DEFAULT_LONG_WINDOW: usize = 25;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyVariant {
    MaCrossover {
        short_window: usize,
        long_window: usize,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    Bollinger {
        period: usize,
        multiplier: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

/// Identifier of a variant as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    MaCrossover,
    Rsi,
    Bollinger,
    Macd,
}

impl FromStr for VariantKind {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_crossover" => Ok(VariantKind::MaCrossover),
            "rsi" => Ok(VariantKind::Rsi),
            "bollinger" => Ok(VariantKind::Bollinger),
            "macd" => Ok(VariantKind::Macd),
            other => Err(ScreenerError::invalid_parameter(
                "strategy_variant",
                format!("unknown variant '{other}' (expected ma_crossover, rsi, bollinger or macd)"),
            )),
        }
    }
}

impl StrategyVariant {
    pub fn kind(&self) -> VariantKind {
        match self {
            StrategyVariant::MaCrossover { .. } => VariantKind::MaCrossover,
            StrategyVariant::Rsi { .. } => VariantKind::Rsi,
            StrategyVariant::Bollinger { .. } => VariantKind::Bollinger,
            StrategyVariant::Macd { .. } => VariantKind::Macd,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind() {
            VariantKind::MaCrossover => "ma_crossover",
            VariantKind::Rsi => "rsi",
            VariantKind::Bollinger => "bollinger",
            VariantKind::Macd => "macd",
        }
    }

    pub fn default_for(kind: VariantKind) -> Self {
        match kind {
            VariantKind::MaCrossover => StrategyVariant::MaCrossover {
                short_window: DEFAULT_SHORT_WINDOW,
                long_window: DEFAULT_LONG_WINDOW,
            },
            VariantKind::Rsi => StrategyVariant::Rsi {
                period: DEFAULT_RSI_PERIOD,
                oversold: DEFAULT_OVERSOLD,
                overbought: DEFAULT_OVERBOUGHT,
            },
            VariantKind::Bollinger => StrategyVariant::Bollinger {
                period: bollinger::DEFAULT_PERIOD,
                multiplier: bollinger::DEFAULT_MULTIPLIER,
            },
            VariantKind::Macd => StrategyVariant::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
        }
    }

    /// Number of leading bars without a defined indicator value.
    pub fn warmup(&self) -> usize {
        match *self {
            StrategyVariant::MaCrossover {
                short_window,
                long_window,
            } => short_window.max(long_window).saturating_sub(1),
            StrategyVariant::Rsi { period, .. } => period.saturating_sub(1),
            StrategyVariant::Bollinger { period, .. } => period.saturating_sub(1),
            StrategyVariant::Macd { fast, slow, signal } => macd::warmup(fast, slow, signal),
        }
    }

    /// Fewest bars that can yield a defined indicator value.
    pub fn min_bars(&self) -> usize {
        self.warmup() + 1
    }

    pub fn indicators(&self) -> Vec<IndicatorType> {
        match *self {
            StrategyVariant::MaCrossover {
                short_window,
                long_window,
            } => vec![IndicatorType::Sma(short_window), IndicatorType::Sma(long_window)],
            StrategyVariant::Rsi { period, .. } => vec![IndicatorType::Rsi(period)],
            StrategyVariant::Bollinger { period, multiplier } => vec![IndicatorType::Bollinger {
                period,
                stddev_mult_x100: (multiplier * 100.0).round() as u32,
            }],
            StrategyVariant::Macd { fast, slow, signal } => {
                vec![IndicatorType::Macd { fast, slow, signal }]
            }
        }
    }

    pub fn validate(&self) -> Result<(), ScreenerError> {
        match *self {
            StrategyVariant::MaCrossover {
                short_window,
                long_window,
            } => {
                require_positive("short_window", short_window)?;
                require_positive("long_window", long_window)?;
                if short_window >= long_window {
                    return Err(ScreenerError::invalid_parameter(
                        "short_window",
                        format!("short_window ({short_window}) must be below long_window ({long_window})"),
                    ));
                }
            }
            StrategyVariant::Rsi {
                period,
                oversold,
                overbought,
            } => {
                require_positive("rsi_period", period)?;
                require_level("oversold", oversold)?;
                require_level("overbought", overbought)?;
                if oversold >= overbought {
                    return Err(ScreenerError::invalid_parameter(
                        "oversold",
                        format!("oversold ({oversold}) must be below overbought ({overbought})"),
                    ));
                }
            }
            StrategyVariant::Bollinger { period, multiplier } => {
                if period < 2 {
                    return Err(ScreenerError::invalid_parameter(
                        "bb_period",
                        "bb_period must be at least 2",
                    ));
                }
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(ScreenerError::invalid_parameter(
                        "bb_std",
                        "bb_std must be a positive number",
                    ));
                }
            }
            StrategyVariant::Macd { fast, slow, signal } => {
                require_positive("macd_fast", fast)?;
                require_positive("macd_slow", slow)?;
                require_positive("macd_signal", signal)?;
                if fast >= slow {
                    return Err(ScreenerError::invalid_parameter(
                        "macd_fast",
                        format!("macd_fast ({fast}) must be below macd_slow ({slow})"),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn require_positive(name: &str, value: usize) -> Result<(), ScreenerError> {
    if value == 0 {
        return Err(ScreenerError::invalid_parameter(name, format!("{name} must be positive")));
    }
    Ok(())
}

fn require_level(name: &str, value: f64) -> Result<(), ScreenerError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ScreenerError::invalid_parameter(
            name,
            format!("{name} must be between 0 and 100"),
        ));
    }
    Ok(())
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyVariant::MaCrossover {
                short_window,
                long_window,
            } => write!(f, "MA crossover (SMA{} / SMA{})", short_window, long_window),
            StrategyVariant::Rsi {
                period,
                oversold,
                overbought,
            } => write!(f, "RSI({}) {}/{}", period, oversold, overbought),
            StrategyVariant::Bollinger { period, multiplier } => {
                write!(f, "Bollinger({}, {}σ)", period, multiplier)
            }
            StrategyVariant::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
