//! Performance statistics over an equity curve and its trade list.
//!
//! Returns and drawdown are expressed in percent. Zero-division cases have
//! fixed sentinel outputs: Sharpe 0.0 on zero volatility, profit factor
//! +inf with no losing trades and 0.0 with no trades of either sign.

use super::backtest::{BacktestConfig, EquityCurve, EquityPoint};
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_return: f64,
    pub buy_hold_return: f64,
    pub excess_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
    pub initial_value: f64,
    pub final_value: f64,
    pub profit_loss: f64,
}

impl Metrics {
    pub fn compute(curve: &EquityCurve, trades: &[Trade], config: &BacktestConfig) -> Self {
        let trade_count = trades.len();
        let wins = trades.iter().filter(|t| t.win).count();
        let losses = trade_count - wins;

        let win_rate = if trade_count > 0 {
            100.0 * wins as f64 / trade_count as f64
        } else {
            0.0
        };

        let total_return = 100.0 * (curve.final_strategy_factor() - 1.0);
        let buy_hold_return = 100.0 * (curve.final_benchmark_factor() - 1.0);

        let per_period_rf = config.risk_free_rate / f64::from(config.periods_per_year);
        let sharpe_ratio = compute_sharpe(
            &curve.strategy_returns(),
            per_period_rf,
            config.periods_per_year,
        );

        let final_value = curve.final_value();

        Metrics {
            trade_count,
            wins,
            losses,
            win_rate,
            total_return,
            buy_hold_return,
            excess_return: total_return - buy_hold_return,
            max_drawdown: compute_drawdown(&curve.points),
            sharpe_ratio,
            profit_factor: compute_profit_factor(trades),
            initial_value: curve.initial_capital,
            final_value,
            profit_loss: final_value - curve.initial_capital,
        }
    }
}

/// Deepest decline from the running peak, in percent. Always <= 0.
pub(crate) fn compute_drawdown(points: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for point in points {
        let value = point.portfolio_value;
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = 100.0 * (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

pub(crate) fn compute_sharpe(returns: &[f64], per_period_rf: f64, periods_per_year: u32) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    // Identical returns must map to exactly zero volatility.
    if returns.iter().all(|&r| r == returns[0]) {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if !stddev.is_finite() || stddev == 0.0 {
        return 0.0;
    }

    let excess_mean = mean - per_period_rf;
    f64::from(periods_per_year).sqrt() * excess_mean / stddev
}

pub(crate) fn compute_profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .map(|t| t.pnl_percent)
        .filter(|&p| p > 0.0)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .map(|t| t.pnl_percent)
        .filter(|&p| p < 0.0)
        .map(f64::abs)
        .sum();

    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::simulate;
    use crate::domain::signal::{Position, Signal, SignalRow};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i)
    }

    fn make_points(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: day(i as i64),
                close: v,
                market_return: 0.0,
                strategy_return: 0.0,
                strategy_factor: v / values[0],
                benchmark_factor: 1.0,
                portfolio_value: v,
                benchmark_value: values[0],
            })
            .collect()
    }

    fn make_trade(pnl_percent: f64) -> Trade {
        Trade::close(day(0), 100.0, day(5), 100.0 * (1.0 + pnl_percent / 100.0))
    }

    fn long_curve(closes: &[f64]) -> EquityCurve {
        let rows: Vec<SignalRow> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| SignalRow {
                date: day(i as i64),
                close,
                position: Position::Long,
                signal: Signal::Hold,
            })
            .collect();
        simulate(&rows, 1_000_000.0)
    }

    #[test]
    fn win_rate_and_profit_factor_from_two_trades() {
        let trades = vec![make_trade(10.0), make_trade(-5.0)];
        let curve = long_curve(&[100.0, 101.0]);
        let m = Metrics::compute(&curve, &trades, &BacktestConfig::default());

        assert_eq!(m.trade_count, 2);
        assert_eq!(m.wins, 1);
        assert_eq!(m.losses, 1);
        assert_relative_eq!(m.win_rate, 50.0, epsilon = 1e-9);
        assert_relative_eq!(m.profit_factor, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn breakeven_trade_counts_as_loss() {
        let trades = vec![make_trade(4.0), make_trade(0.0)];
        let m = Metrics::compute(&long_curve(&[100.0, 101.0]), &trades, &BacktestConfig::default());

        assert_eq!(m.wins, 1);
        assert_eq!(m.losses, 1);
        assert_eq!(m.wins + m.losses, m.trade_count);
        assert_relative_eq!(m.win_rate, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn no_trades_has_zero_win_rate_and_profit_factor() {
        let m = Metrics::compute(&long_curve(&[100.0, 110.0]), &[], &BacktestConfig::default());
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
    }

    #[test]
    fn only_winners_gives_infinite_profit_factor() {
        assert_eq!(
            compute_profit_factor(&[make_trade(3.0), make_trade(1.0)]),
            f64::INFINITY
        );
    }

    #[test]
    fn breakeven_trades_give_zero_profit_factor() {
        assert_eq!(compute_profit_factor(&[make_trade(0.0)]), 0.0);
    }

    #[test]
    fn total_and_buy_hold_returns() {
        let m = Metrics::compute(
            &long_curve(&[100.0, 105.0, 110.0]),
            &[],
            &BacktestConfig::default(),
        );
        assert_relative_eq!(m.total_return, 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.buy_hold_return, 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.excess_return, 0.0, epsilon = 1e-9);
        assert_relative_eq!(m.final_value, 1_100_000.0, epsilon = 1e-6);
        assert_relative_eq!(m.profit_loss, 100_000.0, epsilon = 1e-6);
        assert_eq!(m.initial_value, 1_000_000.0);
    }

    #[test]
    fn max_drawdown_percent() {
        let dd = compute_drawdown(&make_points(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]));
        assert_relative_eq!(dd, 100.0 * (80.0 - 110.0) / 110.0, epsilon = 1e-9);
    }

    #[test]
    fn non_decreasing_curve_has_zero_drawdown() {
        let dd = compute_drawdown(&make_points(&[100.0, 100.0, 101.0, 120.0]));
        assert_eq!(dd, 0.0);
        assert_eq!(compute_drawdown(&[]), 0.0);
    }

    #[test]
    fn sharpe_zero_on_constant_returns() {
        assert_eq!(compute_sharpe(&[0.01, 0.01, 0.01, 0.01], 0.0, 252), 0.0);
        assert_eq!(compute_sharpe(&[0.0, 0.0], 0.0, 252), 0.0);
    }

    #[test]
    fn sharpe_zero_on_short_series() {
        assert_eq!(compute_sharpe(&[], 0.0, 252), 0.0);
        assert_eq!(compute_sharpe(&[0.05], 0.0, 252), 0.0);
    }

    #[test]
    fn sharpe_uses_sample_deviation() {
        // mean 0.01, sample sd of [0.02, 0.0] = sqrt(0.0002) = 0.014142
        let s = compute_sharpe(&[0.02, 0.0], 0.0, 4);
        assert_relative_eq!(s, 2.0 * 0.01 / 0.0002_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn sharpe_subtracts_per_period_risk_free() {
        let returns = [0.02, 0.0, 0.01, 0.03];
        let without = compute_sharpe(&returns, 0.0, 252);
        let with = compute_sharpe(&returns, 0.05 / 252.0, 252);
        assert!(with < without);
        assert!(with.is_finite());
    }

    #[test]
    fn empty_curve_metrics() {
        let curve = simulate(&[], 500.0);
        let m = Metrics::compute(&curve, &[], &BacktestConfig::default());
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.final_value, 500.0);
    }
}
