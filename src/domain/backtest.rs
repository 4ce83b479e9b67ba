//! Backtest simulation: position series to equity curve.
//!
//! The position held at the close of bar t-1 earns the close-to-close return
//! of bar t. The first retained bar is the origin of both cumulative products.

use crate::domain::error::ScreenerError;
use crate::domain::signal::{Signal, SignalRow};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub periods_per_year: u32,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ScreenerError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ScreenerError::invalid_parameter(
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if self.periods_per_year == 0 {
            return Err(ScreenerError::invalid_parameter(
                "periods_per_year",
                "periods_per_year must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(ScreenerError::invalid_parameter(
                "risk_free_rate",
                "risk_free_rate must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// One bar of the simulated curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub market_return: f64,
    pub strategy_return: f64,
    pub strategy_factor: f64,
    pub benchmark_factor: f64,
    pub portfolio_value: f64,
    pub benchmark_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    pub initial_capital: f64,
    pub points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_value(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or(self.initial_capital)
    }

    pub fn final_strategy_factor(&self) -> f64 {
        self.points.last().map(|p| p.strategy_factor).unwrap_or(1.0)
    }

    pub fn final_benchmark_factor(&self) -> f64 {
        self.points.last().map(|p| p.benchmark_factor).unwrap_or(1.0)
    }

    /// Per-bar strategy returns, excluding the origin bar.
    pub fn strategy_returns(&self) -> Vec<f64> {
        self.points.iter().skip(1).map(|p| p.strategy_return).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

pub fn simulate(rows: &[SignalRow], initial_capital: f64) -> EquityCurve {
    let mut points = Vec::with_capacity(rows.len());
    let mut strategy_factor = 1.0_f64;
    let mut benchmark_factor = 1.0_f64;

    for (i, row) in rows.iter().enumerate() {
        let (market_return, strategy_return) = if i == 0 {
            (0.0, 0.0)
        } else {
            let prev = &rows[i - 1];
            let r = row.close / prev.close - 1.0;
            (r, prev.position.factor() * r)
        };

        if i > 0 {
            strategy_factor *= 1.0 + strategy_return;
            benchmark_factor *= 1.0 + market_return;
        }

        points.push(EquityPoint {
            date: row.date,
            close: row.close,
            market_return,
            strategy_return,
            strategy_factor,
            benchmark_factor,
            portfolio_value: initial_capital * strategy_factor,
            benchmark_value: initial_capital * benchmark_factor,
        });
    }

    EquityCurve {
        initial_capital,
        points,
    }
}

/// A nonzero signal together with the portfolio value on that bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
    pub portfolio_value: f64,
}

pub fn signal_events(rows: &[SignalRow], curve: &EquityCurve) -> Vec<SignalEvent> {
    rows.iter()
        .zip(&curve.points)
        .filter(|(row, _)| row.signal != Signal::Hold)
        .map(|(row, point)| SignalEvent {
            date: row.date,
            close: row.close,
            signal: row.signal,
            portfolio_value: point.portfolio_value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Position;
    use approx::assert_relative_eq;

    fn rows(closes: &[f64], positions: &[Position]) -> Vec<SignalRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (&close, &position))| SignalRow {
                date: start + chrono::Duration::days(i as i64),
                close,
                position,
                signal: Signal::Hold,
            })
            .collect()
    }

    #[test]
    fn empty_rows_give_empty_curve() {
        let curve = simulate(&[], 1000.0);
        assert!(curve.is_empty());
        assert_eq!(curve.final_value(), 1000.0);
        assert_eq!(curve.final_strategy_factor(), 1.0);
        assert!(curve.strategy_returns().is_empty());
    }

    #[test]
    fn origin_point_starts_at_initial_capital() {
        let curve = simulate(&rows(&[100.0], &[Position::Short]), 1000.0);
        assert_eq!(curve.len(), 1);
        let p = &curve.points[0];
        assert_eq!(p.portfolio_value, 1000.0);
        assert_eq!(p.benchmark_value, 1000.0);
        assert_eq!(p.strategy_return, 0.0);
    }

    #[test]
    fn strategy_uses_previous_bar_position() {
        use Position::*;
        // Position flips to Short on bar 1; the bar-1 return still belongs to Long.
        let curve = simulate(
            &rows(&[100.0, 110.0, 99.0], &[Long, Short, Short]),
            1000.0,
        );

        assert_relative_eq!(curve.points[1].strategy_return, 0.10, epsilon = 1e-12);
        assert_relative_eq!(curve.points[2].strategy_return, 0.10, epsilon = 1e-12);
        assert_relative_eq!(curve.points[2].market_return, -0.10, epsilon = 1e-12);
        assert_relative_eq!(curve.final_value(), 1210.0, epsilon = 1e-9);
        assert_relative_eq!(curve.points[2].benchmark_value, 990.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_long_matches_benchmark() {
        let closes = [100.0, 103.0, 101.5, 99.0, 104.2, 108.0];
        let curve = simulate(&rows(&closes, &[Position::Long; 6]), 1_000_000.0);
        for p in &curve.points {
            assert_eq!(p.portfolio_value, p.benchmark_value);
        }
        assert_relative_eq!(curve.final_benchmark_factor(), 1.08, epsilon = 1e-12);
    }

    #[test]
    fn output_length_matches_input() {
        let closes = [10.0, 11.0, 12.0, 11.0];
        let curve = simulate(&rows(&closes, &[Position::Long; 4]), 1.0);
        assert_eq!(curve.len(), 4);
        assert_eq!(curve.strategy_returns().len(), 3);
    }

    #[test]
    fn events_only_for_nonzero_signals() {
        let mut rows = rows(&[100.0, 110.0, 121.0], &[Position::Long; 3]);
        rows[1].signal = Signal::Buy;
        let curve = simulate(&rows, 100.0);
        let events = signal_events(&rows, &curve);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].signal, Signal::Buy);
        assert_relative_eq!(events[0].portfolio_value, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());

        let bad = BacktestConfig {
            initial_capital: 0.0,
            ..BacktestConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = BacktestConfig {
            periods_per_year: 0,
            ..BacktestConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = BacktestConfig {
            risk_free_rate: 1.5,
            ..BacktestConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
