//! CSV file market data adapter.
//!
//! One file per ticker, `<dir>/<ticker>.csv`, with header
//! `date,open,high,low,close,volume`.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::data_port::{BarInterval, Lookback, MarketDataPort};
use chrono::{Datelike, IsoWeek, NaiveDate};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BarRecord {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl From<BarRecord> for OhlcvBar {
    fn from(r: BarRecord) -> Self {
        OhlcvBar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        }
    }
}

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn read_bars(&self, ticker: &str) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let unavailable = |reason: String| ScreenerError::DataUnavailable {
            ticker: ticker.to_string(),
            reason,
        };

        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = rdr
            .deserialize::<BarRecord>()
            .map(|r| r.map(OhlcvBar::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| unavailable(format!("CSV parse error in {}: {}", path.display(), e)))?;

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

/// Bars dated on or after the lookback start, measured from the last bar.
fn apply_lookback(bars: Vec<OhlcvBar>, lookback: Lookback) -> Vec<OhlcvBar> {
    let Some(last) = bars.last().map(|b| b.date) else {
        return bars;
    };
    let start = lookback.start_from(last);
    bars.into_iter().filter(|b| b.date >= start).collect()
}

/// Collapses daily bars into ISO weeks. Each weekly bar is dated by the last
/// trading day of its week.
pub fn aggregate_weekly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut weeks: Vec<(IsoWeek, OhlcvBar)> = Vec::new();

    for bar in bars {
        let week = bar.date.iso_week();
        match weeks.last_mut() {
            Some((current, agg)) if *current == week => {
                agg.date = bar.date;
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => weeks.push((week, bar.clone())),
        }
    }

    weeks.into_iter().map(|(_, bar)| bar).collect()
}

impl MarketDataPort for CsvDataAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        lookback: Lookback,
        interval: BarInterval,
    ) -> Result<PriceSeries, ScreenerError> {
        let bars = apply_lookback(self.read_bars(ticker)?, lookback);
        let bars = match interval {
            BarInterval::Daily => bars,
            BarInterval::Weekly => aggregate_weekly(&bars),
        };

        if bars.is_empty() {
            return Err(ScreenerError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "no bars found".to_string(),
            });
        }

        debug!(ticker, bars = bars.len(), %lookback, %interval, "loaded price series");
        PriceSeries::new(ticker, bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, ScreenerError> {
        let mut tickers = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}
