//! Batch screening across an instrument universe.
//!
//! Each instrument is fetched and analysed independently. Failures are
//! recorded as skips and never abort the batch. The run is returned to the
//! caller as a value; filtering and ranking are applied on top of it.

use crate::domain::analysis::{AnalysisResult, analyze_instrument};
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScreenerError;
use crate::domain::strategy::StrategyVariant;
use crate::domain::universe::Instrument;
use crate::ports::data_port::{BarInterval, Lookback, MarketDataPort};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_WIN_RATE: f64 = 40.0;
pub const DEFAULT_MIN_TOTAL_RETURN: f64 = 0.0;
pub const DEFAULT_MAX_DRAWDOWN: f64 = -30.0;
pub const DEFAULT_MIN_TRADE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningCriteria {
    pub min_win_rate: f64,
    pub min_total_return: f64,
    /// Non-positive drawdown bound in percent.
    pub max_drawdown_threshold: f64,
    pub min_trade_count: usize,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self {
            min_win_rate: DEFAULT_MIN_WIN_RATE,
            min_total_return: DEFAULT_MIN_TOTAL_RETURN,
            max_drawdown_threshold: DEFAULT_MAX_DRAWDOWN,
            min_trade_count: DEFAULT_MIN_TRADE_COUNT,
        }
    }
}

impl ScreeningCriteria {
    pub fn validate(&self) -> Result<(), ScreenerError> {
        if !(0.0..=100.0).contains(&self.min_win_rate) {
            return Err(ScreenerError::invalid_parameter(
                "min_win_rate",
                "min_win_rate must be between 0 and 100",
            ));
        }
        if !self.min_total_return.is_finite() {
            return Err(ScreenerError::invalid_parameter(
                "min_total_return",
                "min_total_return must be a finite number",
            ));
        }
        if !self.max_drawdown_threshold.is_finite() || self.max_drawdown_threshold > 0.0 {
            return Err(ScreenerError::invalid_parameter(
                "max_drawdown",
                "max_drawdown must be zero or negative",
            ));
        }
        Ok(())
    }

    pub fn accepts(&self, result: &AnalysisResult) -> bool {
        let m = &result.metrics;
        m.win_rate >= self.min_win_rate
            && m.total_return >= self.min_total_return
            && m.max_drawdown >= self.max_drawdown_threshold
            && m.trade_count >= self.min_trade_count
    }
}

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub strategy: StrategyVariant,
    pub backtest: BacktestConfig,
    pub criteria: ScreeningCriteria,
    pub lookback: Lookback,
    pub interval: BarInterval,
    pub parallel: bool,
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), ScreenerError> {
        self.strategy.validate()?;
        self.backtest.validate()?;
        self.criteria.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    DataUnavailable(String),
    InsufficientHistory { bars: usize, minimum: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable(reason) => write!(f, "data unavailable: {reason}"),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "only {bars} bars, minimum {minimum} required")
            }
        }
    }
}

impl From<ScreenerError> for SkipReason {
    fn from(err: ScreenerError) -> Self {
        match err {
            ScreenerError::InsufficientHistory { bars, minimum, .. } => {
                SkipReason::InsufficientHistory { bars, minimum }
            }
            ScreenerError::DataUnavailable { reason, .. } => SkipReason::DataUnavailable(reason),
            other => SkipReason::DataUnavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedInstrument {
    pub ticker: String,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorSummary {
    pub sector: String,
    pub count: usize,
    pub mean_total_return: f64,
    pub mean_win_rate: f64,
    pub mean_sharpe: f64,
}

/// Outcome of one screening batch, in universe order.
#[derive(Debug, Clone, Default)]
pub struct ScreenRun {
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedInstrument>,
}

impl ScreenRun {
    pub fn analysed(&self) -> usize {
        self.results.len()
    }

    /// Results passing `criteria`, best total return first. Ties keep
    /// universe order.
    pub fn ranked(&self, criteria: &ScreeningCriteria) -> Vec<&AnalysisResult> {
        let mut kept: Vec<&AnalysisResult> =
            self.results.iter().filter(|r| criteria.accepts(r)).collect();
        sort_by_return(&mut kept);
        kept
    }

    /// Every analysed result, best total return first.
    pub fn all_by_return(&self) -> Vec<&AnalysisResult> {
        let mut all: Vec<&AnalysisResult> = self.results.iter().collect();
        sort_by_return(&mut all);
        all
    }

    pub fn match_rate(&self, criteria: &ScreeningCriteria) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        100.0 * self.ranked(criteria).len() as f64 / self.results.len() as f64
    }

    /// Per-sector means over all analysed results, sectors in first
    /// appearance order.
    pub fn sector_summaries(&self) -> Vec<SectorSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&AnalysisResult>> = HashMap::new();
        for result in &self.results {
            let sector = result.sector();
            if !groups.contains_key(sector) {
                order.push(sector);
            }
            groups.entry(sector).or_default().push(result);
        }

        order
            .into_iter()
            .map(|sector| {
                let members = &groups[sector];
                let n = members.len() as f64;
                let mean = |f: fn(&AnalysisResult) -> f64| {
                    members.iter().map(|r| f(*r)).sum::<f64>() / n
                };
                SectorSummary {
                    sector: sector.to_string(),
                    count: members.len(),
                    mean_total_return: mean(|r| r.metrics.total_return),
                    mean_win_rate: mean(|r| r.metrics.win_rate),
                    mean_sharpe: mean(|r| r.metrics.sharpe_ratio),
                }
            })
            .collect()
    }

    pub fn find(&self, ticker: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.ticker() == ticker)
    }
}

fn sort_by_return(results: &mut [&AnalysisResult]) {
    results.sort_by(|a, b| b.total_return().total_cmp(&a.total_return()));
}

pub fn run_screen(
    data: &dyn MarketDataPort,
    instruments: &[Instrument],
    config: &ScreenConfig,
) -> ScreenRun {
    info!(
        instruments = instruments.len(),
        strategy = %config.strategy,
        lookback = %config.lookback,
        interval = %config.interval,
        parallel = config.parallel,
        "starting screen"
    );

    let outcomes: Vec<Result<AnalysisResult, SkippedInstrument>> = if config.parallel {
        instruments
            .par_iter()
            .map(|instrument| evaluate(data, instrument, config))
            .collect()
    } else {
        instruments
            .iter()
            .map(|instrument| evaluate(data, instrument, config))
            .collect()
    };

    let mut run = ScreenRun::default();
    for outcome in outcomes {
        match outcome {
            Ok(result) => run.results.push(result),
            Err(skipped) => run.skipped.push(skipped),
        }
    }

    info!(
        analysed = run.results.len(),
        skipped = run.skipped.len(),
        "screen complete"
    );
    run
}

fn evaluate(
    data: &dyn MarketDataPort,
    instrument: &Instrument,
    config: &ScreenConfig,
) -> Result<AnalysisResult, SkippedInstrument> {
    let outcome = data
        .fetch_bars(&instrument.ticker, config.lookback, config.interval)
        .map_err(|e| {
            if e.is_per_instrument() {
                e
            } else {
                ScreenerError::DataUnavailable {
                    ticker: instrument.ticker.clone(),
                    reason: e.to_string(),
                }
            }
        })
        .and_then(|series| {
            debug!(ticker = %instrument.ticker, bars = series.len(), "fetched");
            analyze_instrument(instrument, &series, &config.strategy, &config.backtest)
        });

    outcome.map_err(|e| {
        let reason = SkipReason::from(e);
        warn!(ticker = %instrument.ticker, %reason, "skipping instrument");
        SkippedInstrument {
            ticker: instrument.ticker.clone(),
            name: instrument.name.clone(),
            reason,
        }
    })
}
