//! RSI (Relative Strength Index) indicator.
//!
//! Average gain and average loss are simple rolling means of the positive and
//! negative close-to-close changes over n bars. The first bar has no previous
//! close and contributes a change of 0, so the first value lands on bar n-1.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100.
//! If both averages are 0 the ratio is undefined and so is the point.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: Vec::new(),
        };
    }

    let changes: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| if i == 0 { 0.0 } else { bar.close - bars[i - 1].close })
        .collect();
    let gains: Vec<f64> = changes.iter().map(|&c| c.max(0.0)).collect();
    let losses: Vec<f64> = changes.iter().map(|&c| (-c).max(0.0)).collect();

    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.date, IndicatorValue::Simple(0.0)));
            continue;
        }

        let window = i + 1 - period..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

        let rsi = if avg_loss > 0.0 {
            Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
        } else if avg_gain > 0.0 {
            Some(100.0)
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: rsi.is_some(),
            value: IndicatorValue::Simple(rsi.unwrap_or(0.0)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
