//! Single-instrument pipeline: indicators, signals, simulation, trades, metrics.

use crate::domain::backtest::{BacktestConfig, EquityCurve, SignalEvent, signal_events, simulate};
use crate::domain::error::ScreenerError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::generate_signals;
use crate::domain::strategy::StrategyVariant;
use crate::domain::trade::{Trade, extract_trades};
use crate::domain::universe::Instrument;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub instrument: Instrument,
    pub strategy: String,
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub equity: EquityCurve,
    pub events: Vec<SignalEvent>,
}

impl AnalysisResult {
    pub fn ticker(&self) -> &str {
        &self.instrument.ticker
    }

    pub fn sector(&self) -> &str {
        &self.instrument.sector
    }

    pub fn total_return(&self) -> f64 {
        self.metrics.total_return
    }

    /// First and last date of the simulated curve.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.equity.first_date().zip(self.equity.last_date())
    }
}

/// A series shorter than the variant's lookback is `InsufficientHistory`. A
/// long enough series whose signal never enters a position yields an empty
/// curve and no trades.
pub fn analyze_instrument(
    instrument: &Instrument,
    series: &PriceSeries,
    variant: &StrategyVariant,
    config: &BacktestConfig,
) -> Result<AnalysisResult, ScreenerError> {
    if series.len() < variant.min_bars() {
        return Err(ScreenerError::InsufficientHistory {
            ticker: instrument.ticker.clone(),
            bars: series.len(),
            minimum: variant.min_bars(),
        });
    }

    let rows = generate_signals(series.bars(), variant);
    let equity = simulate(&rows, config.initial_capital);
    let trades = extract_trades(&rows);
    let events = signal_events(&rows, &equity);
    let metrics = Metrics::compute(&equity, &trades, config);

    Ok(AnalysisResult {
        instrument: instrument.clone(),
        strategy: variant.to_string(),
        metrics,
        trades,
        equity,
        events,
    })
}
