//! Signal generation: indicator state to aligned position/signal rows.
//!
//! Two families:
//! - Crossover (MA pair, MACD vs signal line): the position follows the
//!   relative order of the two lines on every defined bar.
//! - Threshold-cross (RSI, Bollinger): the position is sticky and only moves
//!   on an explicit crossing event. Bars before the first event are not
//!   entered and produce no row.
//!
//! Both are left-to-right scans that thread their state explicitly.

use crate::domain::indicator::{
    IndicatorValue, calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyVariant;
use chrono::NaiveDate;
use serde::Serialize;

/// Net position held after the close of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Position {
    Long,
    Short,
}

impl Position {
    pub fn value(self) -> i8 {
        match self {
            Position::Long => 1,
            Position::Short => -1,
        }
    }

    pub fn factor(self) -> f64 {
        f64::from(self.value())
    }
}

/// Position-change event on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Hold => 0,
            Signal::Sell => -1,
        }
    }

    /// The position a nonzero signal moves to.
    pub fn target(self) -> Option<Position> {
        match self {
            Signal::Buy => Some(Position::Long),
            Signal::Hold => None,
            Signal::Sell => Some(Position::Short),
        }
    }

    fn from_transition(prev: Option<Position>, current: Position) -> Self {
        match (prev, current) {
            (Some(Position::Short), Position::Long) => Signal::Buy,
            (Some(Position::Long), Position::Short) => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

/// One bar of the aligned (PositionSeries, SignalSeries) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub close: f64,
    pub position: Position,
    pub signal: Signal,
}

pub fn generate_signals(bars: &[OhlcvBar], variant: &StrategyVariant) -> Vec<SignalRow> {
    match *variant {
        StrategyVariant::MaCrossover {
            short_window,
            long_window,
        } => {
            let fast = calculate_sma(bars, short_window);
            let slow = calculate_sma(bars, long_window);
            let pairs = fast
                .values
                .iter()
                .zip(&slow.values)
                .map(|(f, s)| f.simple().zip(s.simple()));
            crossover_rows(bars, pairs)
        }
        StrategyVariant::Macd { fast, slow, signal } => {
            let macd = calculate_macd(bars, fast, slow, signal);
            let pairs = macd.values.iter().map(|p| match p.value {
                IndicatorValue::Macd { line, signal, .. } if p.valid => Some((line, signal)),
                _ => None,
            });
            crossover_rows(bars, pairs)
        }
        StrategyVariant::Rsi {
            period,
            oversold,
            overbought,
        } => {
            let rsi = calculate_rsi(bars, period);
            let readings = rsi.values.iter().map(|p| p.simple());
            threshold_rows(bars, readings, |prev, current, _close| match prev {
                Some(p) if p < oversold && current >= oversold => Signal::Buy,
                Some(p) if p > overbought && current <= overbought => Signal::Sell,
                _ => Signal::Hold,
            })
        }
        StrategyVariant::Bollinger { period, multiplier } => {
            let bands = calculate_bollinger(bars, period, multiplier);
            let readings = bands.values.iter().map(|p| match p.value {
                IndicatorValue::Bollinger { upper, lower, .. } if p.valid => Some((upper, lower)),
                _ => None,
            });
            threshold_rows(bars, readings, |_prev, (upper, lower), close| {
                if close <= lower {
                    Signal::Buy
                } else if close >= upper {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
        }
    }
}

/// Position = Long when the fast line is strictly above the slow line.
fn crossover_rows<I>(bars: &[OhlcvBar], pairs: I) -> Vec<SignalRow>
where
    I: Iterator<Item = Option<(f64, f64)>>,
{
    bars.iter()
        .zip(pairs)
        .scan(None::<Position>, |prev, (bar, pair)| {
            let row = pair.map(|(fast, slow)| {
                let position = if fast > slow {
                    Position::Long
                } else {
                    Position::Short
                };
                let signal = Signal::from_transition(*prev, position);
                *prev = Some(position);
                SignalRow {
                    date: bar.date,
                    close: bar.close,
                    position,
                    signal,
                }
            });
            Some(row)
        })
        .flatten()
        .collect()
}

/// State carried between bars of a threshold scan.
#[derive(Debug, Clone, Copy)]
struct ThresholdState<R> {
    prev_reading: Option<R>,
    position: Option<Position>,
}

impl<R: Copy> ThresholdState<R> {
    fn step(self, reading: Option<R>, signal: Signal) -> Self {
        ThresholdState {
            prev_reading: reading,
            position: signal.target().or(self.position),
        }
    }
}

fn threshold_rows<R, I, F>(bars: &[OhlcvBar], readings: I, detect: F) -> Vec<SignalRow>
where
    R: Copy,
    I: Iterator<Item = Option<R>>,
    F: Fn(Option<R>, R, f64) -> Signal,
{
    let initial = ThresholdState {
        prev_reading: None,
        position: None,
    };

    bars.iter()
        .zip(readings)
        .scan(initial, |state, (bar, reading)| {
            let signal = reading
                .map(|current| detect(state.prev_reading, current, bar.close))
                .unwrap_or(Signal::Hold);
            *state = state.step(reading, signal);

            let row = match (reading, state.position) {
                (Some(_), Some(position)) => Some(SignalRow {
                    date: bar.date,
                    close: bar.close,
                    position,
                    signal,
                }),
                _ => None,
            };
            Some(row)
        })
        .flatten()
        .collect()
}
