//! CSV report adapter.
//!
//! Writes one directory per run:
//! - `ranking.csv`: results passing the criteria, best first
//! - `all_results.csv`: every analysed instrument, best first
//! - `sectors.csv`: sector means
//! - `trades_<ticker>.csv` and `equity_<ticker>.csv` for each ranked instrument

use crate::domain::analysis::AnalysisResult;
use crate::domain::error::ScreenerError;
use crate::domain::screener::{ScreenRun, ScreeningCriteria, SectorSummary};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    rank: usize,
    ticker: &'a str,
    name: &'a str,
    sector: &'a str,
    strategy: &'a str,
    trade_count: usize,
    wins: usize,
    losses: usize,
    win_rate: f64,
    total_return: f64,
    buy_hold_return: f64,
    excess_return: f64,
    max_drawdown: f64,
    sharpe_ratio: f64,
    profit_factor: String,
    final_value: f64,
    profit_loss: f64,
}

impl<'a> ResultRow<'a> {
    fn new(rank: usize, r: &'a AnalysisResult) -> Self {
        let m = &r.metrics;
        ResultRow {
            rank,
            ticker: &r.instrument.ticker,
            name: &r.instrument.name,
            sector: &r.instrument.sector,
            strategy: &r.strategy,
            trade_count: m.trade_count,
            wins: m.wins,
            losses: m.losses,
            win_rate: m.win_rate,
            total_return: m.total_return,
            buy_hold_return: m.buy_hold_return,
            excess_return: m.excess_return,
            max_drawdown: m.max_drawdown,
            sharpe_ratio: m.sharpe_ratio,
            profit_factor: format_profit_factor(m.profit_factor),
            final_value: m.final_value,
            profit_loss: m.profit_loss,
        }
    }
}

pub fn format_profit_factor(pf: f64) -> String {
    if pf.is_infinite() {
        "inf".to_string()
    } else {
        format!("{pf:.2}")
    }
}

/// Ticker made safe for a file name.
fn file_stem(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

const RESULT_HEADER: &[&str] = &[
    "rank",
    "ticker",
    "name",
    "sector",
    "strategy",
    "trade_count",
    "wins",
    "losses",
    "win_rate",
    "total_return",
    "buy_hold_return",
    "excess_return",
    "max_drawdown",
    "sharpe_ratio",
    "profit_factor",
    "final_value",
    "profit_loss",
];

const SECTOR_HEADER: &[&str] = &[
    "sector",
    "count",
    "mean_total_return",
    "mean_win_rate",
    "mean_sharpe",
];

const TRADE_HEADER: &[&str] = &[
    "entry_date",
    "entry_price",
    "exit_date",
    "exit_price",
    "pnl_percent",
    "win",
];

const EQUITY_HEADER: &[&str] = &[
    "date",
    "close",
    "market_return",
    "strategy_return",
    "strategy_factor",
    "benchmark_factor",
    "portfolio_value",
    "benchmark_value",
];

/// Writes `header` then one record per row. The header is written even when
/// there are no rows.
fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ScreenerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write_screen(
        &self,
        run: &ScreenRun,
        criteria: &ScreeningCriteria,
        output_dir: &Path,
    ) -> Result<(), ScreenerError> {
        fs::create_dir_all(output_dir)?;

        let ranked = run.ranked(criteria);
        write_rows(
            &output_dir.join("ranking.csv"),
            RESULT_HEADER,
            ranked.iter().enumerate().map(|(i, r)| ResultRow::new(i + 1, r)),
        )?;
        write_rows(
            &output_dir.join("all_results.csv"),
            RESULT_HEADER,
            run.all_by_return()
                .iter()
                .enumerate()
                .map(|(i, r)| ResultRow::new(i + 1, r)),
        )?;
        write_sectors(&output_dir.join("sectors.csv"), &run.sector_summaries())?;

        for result in &ranked {
            self.write_instrument(result, output_dir)?;
        }

        info!(
            dir = %output_dir.display(),
            ranked = ranked.len(),
            analysed = run.analysed(),
            "report written"
        );
        Ok(())
    }

    fn write_instrument(
        &self,
        result: &AnalysisResult,
        output_dir: &Path,
    ) -> Result<(), ScreenerError> {
        let stem = file_stem(result.ticker());
        write_rows(
            &output_dir.join(format!("trades_{stem}.csv")),
            TRADE_HEADER,
            &result.trades,
        )?;
        write_rows(
            &output_dir.join(format!("equity_{stem}.csv")),
            EQUITY_HEADER,
            &result.equity.points,
        )?;
        Ok(())
    }
}

fn write_sectors(path: &Path, summaries: &[SectorSummary]) -> Result<(), ScreenerError> {
    #[derive(Serialize)]
    struct SectorRow<'a> {
        sector: &'a str,
        count: usize,
        mean_total_return: f64,
        mean_win_rate: f64,
        mean_sharpe: f64,
    }

    write_rows(
        path,
        SECTOR_HEADER,
        summaries.iter().map(|s| SectorRow {
            sector: &s.sector,
            count: s.count,
            mean_total_return: s.mean_total_return,
            mean_win_rate: s.mean_win_rate,
            mean_sharpe: s.mean_sharpe,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::analyze_instrument;
    use crate::domain::backtest::BacktestConfig;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::ohlcv::PriceSeries;
    use crate::domain::strategy::StrategyVariant;
    use crate::domain::universe::Instrument;
    use tempfile::TempDir;

    fn sample_run() -> ScreenRun {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i as f64) * 0.5).sin() * 8.0)
            .collect();
        let series = PriceSeries::new("7203.T", make_bars(&prices)).unwrap();
        let variant = StrategyVariant::MaCrossover {
            short_window: 2,
            long_window: 5,
        };
        let result = analyze_instrument(
            &Instrument::new("7203.T", "Toyota Motor", "Automotive"),
            &series,
            &variant,
            &BacktestConfig::default(),
        )
        .unwrap();
        ScreenRun {
            results: vec![result],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn writes_all_files() {
        let dir = TempDir::new().unwrap();
        let run = sample_run();
        let criteria = ScreeningCriteria {
            min_win_rate: 0.0,
            min_total_return: -100.0,
            max_drawdown_threshold: -100.0,
            min_trade_count: 0,
        };

        CsvReportAdapter
            .write_screen(&run, &criteria, dir.path())
            .unwrap();

        for name in [
            "ranking.csv",
            "all_results.csv",
            "sectors.csv",
            "trades_7203.T.csv",
            "equity_7203.T.csv",
        ] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }

        let ranking = fs::read_to_string(dir.path().join("ranking.csv")).unwrap();
        let mut lines = ranking.lines();
        assert!(lines.next().unwrap().starts_with("rank,ticker,name,sector"));
        assert!(lines.next().unwrap().starts_with("1,7203.T,Toyota Motor,Automotive"));

        let equity = fs::read_to_string(dir.path().join("equity_7203.T.csv")).unwrap();
        assert_eq!(equity.lines().count(), run.results[0].equity.len() + 1);
        assert_eq!(equity.lines().next().unwrap(), EQUITY_HEADER.join(","));

        let trades = fs::read_to_string(dir.path().join("trades_7203.T.csv")).unwrap();
        assert_eq!(trades.lines().next().unwrap(), TRADE_HEADER.join(","));
        assert_eq!(trades.lines().count(), run.results[0].trades.len() + 1);

        let sectors = fs::read_to_string(dir.path().join("sectors.csv")).unwrap();
        let mut sector_lines = sectors.lines();
        assert_eq!(sector_lines.next().unwrap(), SECTOR_HEADER.join(","));
        assert!(sector_lines.next().unwrap().starts_with("Automotive,1,"));
    }

    #[test]
    fn unranked_instruments_get_no_detail_files() {
        let dir = TempDir::new().unwrap();
        let criteria = ScreeningCriteria {
            min_trade_count: 1000,
            ..ScreeningCriteria::default()
        };
        CsvReportAdapter
            .write_screen(&sample_run(), &criteria, dir.path())
            .unwrap();

        let ranking = fs::read_to_string(dir.path().join("ranking.csv")).unwrap();
        let lines: Vec<&str> = ranking.lines().collect();
        assert_eq!(lines, vec![RESULT_HEADER.join(",")]);
        assert!(!dir.path().join("trades_7203.T.csv").exists());
        assert!(dir.path().join("all_results.csv").exists());
    }

    #[test]
    fn profit_factor_formatting() {
        assert_eq!(format_profit_factor(f64::INFINITY), "inf");
        assert_eq!(format_profit_factor(2.0), "2.00");
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem("7203.T"), "7203.T");
        assert_eq!(file_stem("BRK/B"), "BRK_B");
    }
}
