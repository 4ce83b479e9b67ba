//! OHLCV bar and price series representation.

use crate::domain::error::ScreenerError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Ordered bars for one instrument. Dates are strictly increasing and every
/// close is finite and positive.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, ScreenerError> {
        let ticker = ticker.into();
        if let Some(b) = bars.iter().find(|b| !(b.close.is_finite() && b.close > 0.0)) {
            return Err(ScreenerError::DataUnavailable {
                reason: format!("unusable close {} on {}", b.close, b.date),
                ticker,
            });
        }
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ScreenerError::DataUnavailable {
                reason: format!(
                    "dates not strictly increasing at {} -> {}",
                    w[0].date, w[1].date
                ),
                ticker,
            });
        }
        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 50_000,
        }
    }

    #[test]
    fn accepts_increasing_dates() {
        let series = PriceSeries::new(
            "7203.T",
            vec![bar("2024-01-15", 100.0), bar("2024-01-16", 101.0)],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.ticker(), "7203.T");
        assert_eq!(series.bars()[1].close, 101.0);
        assert_eq!(
            series.last_date(),
            NaiveDate::from_ymd_opt(2024, 1, 16)
        );
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = PriceSeries::new(
            "7203.T",
            vec![bar("2024-01-15", 100.0), bar("2024-01-15", 101.0)],
        );
        assert!(matches!(result, Err(ScreenerError::DataUnavailable { .. })));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let result = PriceSeries::new(
            "7203.T",
            vec![bar("2024-01-16", 100.0), bar("2024-01-15", 101.0)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_and_non_finite_closes() {
        for close in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = PriceSeries::new(
                "7203.T",
                vec![bar("2024-01-15", 100.0), bar("2024-01-16", close)],
            );
            match result {
                Err(ScreenerError::DataUnavailable { reason, .. }) => {
                    assert!(reason.contains("2024-01-16"), "{reason}");
                }
                other => panic!("close {close} accepted: {other:?}"),
            }
        }
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("7203.T", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }
}
