//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, format_profit_factor};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{AnalysisResult, analyze_instrument};
use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_PERIODS_PER_YEAR};
use crate::domain::config_validation::{
    read_double, read_int, read_interval, read_lookback, read_variant_kind, read_window,
    validate_screen_config,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::{bollinger, macd};
use crate::domain::screener::{
    self, ScreenConfig, ScreenRun, ScreeningCriteria, SectorSummary, run_screen,
};
use crate::domain::strategy::{self, StrategyVariant, VariantKind};
use crate::domain::universe::{Instrument, Universe, load_universe_csv, parse_sectors};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockscreen", about = "Technical strategy backtester and stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a strategy across a universe and rank the results
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma separated sectors, overriding [screening] sectors
        #[arg(long)]
        sectors: Option<String>,
        /// Directory for CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest a strategy on a single ticker
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticker: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the instrument universe by sector
    Sectors {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Screen {
            config,
            sectors,
            output,
        } => run_screen_command(&config, sectors.as_deref(), output.as_deref()),
        Command::Backtest { config, ticker } => run_backtest_command(&config, &ticker),
        Command::Validate { config } => run_validate(&config),
        Command::Sectors { config } => run_sectors(config.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_strategy_variant(config: &dyn ConfigPort) -> Result<StrategyVariant, ScreenerError> {
    let variant = match read_variant_kind(config)? {
        VariantKind::MaCrossover => StrategyVariant::MaCrossover {
            short_window: read_window(
                config,
                "strategy",
                "short_window",
                strategy::DEFAULT_SHORT_WINDOW,
            )?,
            long_window: read_window(
                config,
                "strategy",
                "long_window",
                strategy::DEFAULT_LONG_WINDOW,
            )?,
        },
        VariantKind::Rsi => StrategyVariant::Rsi {
            period: read_window(config, "strategy", "rsi_period", strategy::DEFAULT_RSI_PERIOD)?,
            oversold: read_double(config, "strategy", "oversold", strategy::DEFAULT_OVERSOLD)?,
            overbought: read_double(
                config,
                "strategy",
                "overbought",
                strategy::DEFAULT_OVERBOUGHT,
            )?,
        },
        VariantKind::Bollinger => StrategyVariant::Bollinger {
            period: read_window(config, "strategy", "bb_period", bollinger::DEFAULT_PERIOD)?,
            multiplier: read_double(config, "strategy", "bb_std", bollinger::DEFAULT_MULTIPLIER)?,
        },
        VariantKind::Macd => StrategyVariant::Macd {
            fast: read_window(config, "strategy", "macd_fast", macd::DEFAULT_FAST)?,
            slow: read_window(config, "strategy", "macd_slow", macd::DEFAULT_SLOW)?,
            signal: read_window(config, "strategy", "macd_signal", macd::DEFAULT_SIGNAL)?,
        },
    };
    variant.validate()?;
    Ok(variant)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ScreenerError> {
    let periods = read_int(
        config,
        "backtest",
        "periods_per_year",
        i64::from(DEFAULT_PERIODS_PER_YEAR),
    )?;
    let bt = BacktestConfig {
        initial_capital: read_double(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        periods_per_year: u32::try_from(periods).map_err(|_| {
            ScreenerError::invalid_parameter("periods_per_year", "periods_per_year out of range")
        })?,
        risk_free_rate: read_double(config, "backtest", "risk_free_rate", 0.0)?,
    };
    bt.validate()?;
    Ok(bt)
}

pub fn build_criteria(config: &dyn ConfigPort) -> Result<ScreeningCriteria, ScreenerError> {
    let min_trades = read_int(
        config,
        "screening",
        "min_trade_count",
        screener::DEFAULT_MIN_TRADE_COUNT as i64,
    )?;
    let criteria = ScreeningCriteria {
        min_win_rate: read_double(
            config,
            "screening",
            "min_win_rate",
            screener::DEFAULT_MIN_WIN_RATE,
        )?,
        min_total_return: read_double(
            config,
            "screening",
            "min_total_return",
            screener::DEFAULT_MIN_TOTAL_RETURN,
        )?,
        max_drawdown_threshold: read_double(
            config,
            "screening",
            "max_drawdown",
            screener::DEFAULT_MAX_DRAWDOWN,
        )?,
        min_trade_count: usize::try_from(min_trades).map_err(|_| {
            ScreenerError::invalid_parameter("min_trade_count", "min_trade_count must be non-negative")
        })?,
    };
    criteria.validate()?;
    Ok(criteria)
}

pub fn build_screen_config(config: &dyn ConfigPort) -> Result<ScreenConfig, ScreenerError> {
    Ok(ScreenConfig {
        strategy: build_strategy_variant(config)?,
        backtest: build_backtest_config(config)?,
        criteria: build_criteria(config)?,
        lookback: read_lookback(config)?,
        interval: read_interval(config)?,
        parallel: config.get_bool("screening", "parallel", true),
    })
}

pub fn load_universe(config: Option<&dyn ConfigPort>) -> Result<Universe, ScreenerError> {
    match config.and_then(|c| c.get_string("universe", "file")) {
        Some(file) if !file.trim().is_empty() => {
            info!("Loading universe from {}", file.trim());
            load_universe_csv(Path::new(file.trim()))
        }
        _ => Ok(Universe::builtin()),
    }
}

/// Sector override, then `[screening] sectors`, then every sector.
pub fn resolve_sectors(
    config: &dyn ConfigPort,
    sectors_override: Option<&str>,
    universe: &Universe,
) -> Result<Vec<String>, ScreenerError> {
    match sectors_override
        .map(str::to_string)
        .or_else(|| config.get_string("screening", "sectors"))
        .filter(|s| !s.trim().is_empty())
    {
        Some(list) => parse_sectors(&list),
        None => Ok(universe.sectors()),
    }
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvDataAdapter, ScreenerError> {
    let dir = config.require_string("data", "dir")?;
    Ok(CsvDataAdapter::new(PathBuf::from(dir)))
}

fn run_screen_command(
    config_path: &Path,
    sectors_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), ScreenerError> {
    let adapter = load_config(config_path)?;
    validate_screen_config(&adapter)?;
    let screen_config = build_screen_config(&adapter)?;
    let data = data_adapter(&adapter)?;

    let universe = load_universe(Some(&adapter))?;
    let sectors = resolve_sectors(&adapter, sectors_override, &universe)?;
    let instruments = universe.select(&sectors)?;

    info!(
        "Screening {} instruments in {} with {}",
        instruments.len(),
        sectors.join(", "),
        screen_config.strategy
    );

    let run = run_screen(&data, &instruments, &screen_config);
    if run.results.is_empty() {
        return Err(ScreenerError::NoResults);
    }

    let criteria = &screen_config.criteria;
    print!("{}", format_screen_summary(&run, criteria, instruments.len()));

    let ranked = run.ranked(criteria);
    if ranked.is_empty() {
        println!("\nNo instruments matched the screening criteria.");
        println!("\n=== All Results (reference) ===");
        print!("{}", format_result_table(&run.all_by_return()));
    } else {
        println!("\n=== Ranking ===");
        print!("{}", format_result_table(&ranked));
    }

    println!("\n=== Sectors ===");
    print!("{}", format_sector_table(&run.sector_summaries()));

    if let Some(dir) = output {
        CsvReportAdapter.write_screen(&run, criteria, dir)?;
        println!("\nReports written to: {}", dir.display());
    }
    Ok(())
}

fn run_backtest_command(config_path: &Path, ticker: &str) -> Result<(), ScreenerError> {
    let adapter = load_config(config_path)?;
    validate_screen_config(&adapter)?;
    let screen_config = build_screen_config(&adapter)?;
    let data = data_adapter(&adapter)?;
    let universe = load_universe(Some(&adapter))?;

    let instrument = universe
        .find(ticker)
        .cloned()
        .unwrap_or_else(|| Instrument::new(ticker, ticker, "-"));

    let series = data.fetch_bars(ticker, screen_config.lookback, screen_config.interval)?;
    let result = analyze_instrument(
        &instrument,
        &series,
        &screen_config.strategy,
        &screen_config.backtest,
    )?;

    print!("{}", format_analysis(&result));
    println!("\n=== Trades ===");
    print!("{}", format_trades(&result));
    println!("\n=== Signal Events ===");
    print!("{}", format_events(&result));
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    let adapter = load_config(config_path)?;
    validate_screen_config(&adapter)?;
    let screen_config = build_screen_config(&adapter)?;
    let universe = load_universe(Some(&adapter))?;
    let sectors = resolve_sectors(&adapter, None, &universe)?;
    let instruments = universe.select(&sectors)?;

    println!("Config validated successfully");
    println!("\nStrategy: {}", screen_config.strategy);
    println!("Indicators to compute:");
    for ind in screen_config.strategy.indicators() {
        println!("  {ind}");
    }
    println!(
        "\nData: period {}, interval {}",
        screen_config.lookback, screen_config.interval
    );
    println!(
        "Universe: {} instruments in {}",
        instruments.len(),
        sectors.join(", ")
    );
    Ok(())
}

fn run_sectors(config_path: Option<&Path>) -> Result<(), ScreenerError> {
    let adapter = config_path.map(load_config).transpose()?;
    let universe = load_universe(adapter.as_ref().map(|a| a as &dyn ConfigPort))?;

    for sector in universe.sectors() {
        println!("{sector}");
        for instrument in universe.in_sector(&sector) {
            println!("  {:<10} {}", instrument.ticker, instrument.name);
        }
    }
    Ok(())
}

pub fn format_screen_summary(
    run: &ScreenRun,
    criteria: &ScreeningCriteria,
    requested: usize,
) -> String {
    let mut out = String::new();
    let matched = run.ranked(criteria).len();
    let _ = writeln!(out, "=== Screening Summary ===");
    let _ = writeln!(out, "Requested:  {requested}");
    let _ = writeln!(out, "Analysed:   {}", run.analysed());
    let _ = writeln!(out, "Skipped:    {}", run.skipped.len());
    for skipped in &run.skipped {
        let _ = writeln!(out, "  {} ({}): {}", skipped.ticker, skipped.name, skipped.reason);
    }
    let _ = writeln!(out, "Matched:    {matched}");
    let _ = writeln!(out, "Match rate: {:.1}%", run.match_rate(criteria));
    out
}

pub fn format_result_table(results: &[&AnalysisResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<10} {:<26} {:<12} {:>6} {:>8} {:>9} {:>9} {:>9} {:>7} {:>7}",
        "#", "Ticker", "Name", "Sector", "Trades", "Win%", "Return%", "B&H%", "MaxDD%", "Sharpe", "PF"
    );
    for (i, r) in results.iter().enumerate() {
        let m = &r.metrics;
        let _ = writeln!(
            out,
            "{:>4}  {:<10} {:<26} {:<12} {:>6} {:>8.1} {:>9.2} {:>9.2} {:>9.2} {:>7.2} {:>7}",
            i + 1,
            r.instrument.ticker,
            r.instrument.name,
            r.instrument.sector,
            m.trade_count,
            m.win_rate,
            m.total_return,
            m.buy_hold_return,
            m.max_drawdown,
            m.sharpe_ratio,
            format_profit_factor(m.profit_factor),
        );
    }
    out
}

pub fn format_sector_table(summaries: &[SectorSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>5} {:>10} {:>8} {:>8}",
        "Sector", "Count", "Return%", "Win%", "Sharpe"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<14} {:>5} {:>10.2} {:>8.1} {:>8.2}",
            s.sector, s.count, s.mean_total_return, s.mean_win_rate, s.mean_sharpe
        );
    }
    out
}

pub fn format_analysis(result: &AnalysisResult) -> String {
    let m = &result.metrics;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {} {} ({}) ===",
        result.instrument.ticker, result.instrument.name, result.instrument.sector
    );
    let _ = writeln!(out, "Strategy:         {}", result.strategy);
    if let Some((first, last)) = result.period() {
        let _ = writeln!(out, "Period:           {first} to {last}");
    }
    let _ = writeln!(out, "Initial Value:    {:.0}", m.initial_value);
    let _ = writeln!(out, "Final Value:      {:.0}", m.final_value);
    let _ = writeln!(out, "Profit/Loss:      {:+.0}", m.profit_loss);
    let _ = writeln!(out, "Total Return:     {:.2}%", m.total_return);
    let _ = writeln!(out, "Buy & Hold:       {:.2}%", m.buy_hold_return);
    let _ = writeln!(out, "Excess Return:    {:.2}%", m.excess_return);
    let _ = writeln!(out, "Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    let _ = writeln!(out, "Max Drawdown:     {:.2}%", m.max_drawdown);
    let _ = writeln!(
        out,
        "Total Trades:     {} ({} won, {} lost)",
        m.trade_count, m.wins, m.losses
    );
    let _ = writeln!(out, "Win Rate:         {:.1}%", m.win_rate);
    let _ = writeln!(out, "Profit Factor:    {}", format_profit_factor(m.profit_factor));
    out
}

pub fn format_trades(result: &AnalysisResult) -> String {
    if result.trades.is_empty() {
        return "No completed trades\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:<12} {:>10} {:>5} {:>8}  {}",
        "Entry", "Price", "Exit", "Price", "Days", "P&L%", "Result"
    );
    for t in &result.trades {
        let _ = writeln!(
            out,
            "{:<12} {:>10.2} {:<12} {:>10.2} {:>5} {:>+8.2}  {}",
            t.entry_date.to_string(),
            t.entry_price,
            t.exit_date.to_string(),
            t.exit_price,
            t.holding_days(),
            t.pnl_percent,
            if t.win { "WIN" } else { "LOSS" }
        );
    }
    out
}

pub fn format_events(result: &AnalysisResult) -> String {
    if result.events.is_empty() {
        return "No signals\n".to_string();
    }
    let mut out = String::new();
    for e in &result.events {
        let _ = writeln!(
            out,
            "{:<12} {:<5} {:>10.2} {:>14.0}",
            e.date.to_string(),
            format!("{:?}", e.signal).to_uppercase(),
            e.close,
            e.portfolio_value
        );
    }
    out
}
