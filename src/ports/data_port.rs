//! Market data port trait.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::PriceSeries;
use chrono::{Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// How far back from the most recent bar to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
}

impl Lookback {
    pub fn months(self) -> u32 {
        match self {
            Lookback::SixMonths => 6,
            Lookback::OneYear => 12,
            Lookback::TwoYears => 24,
            Lookback::FiveYears => 60,
        }
    }

    /// Earliest date kept for a series ending at `last`.
    pub fn start_from(self, last: NaiveDate) -> NaiveDate {
        last.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl FromStr for Lookback {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "6mo" => Ok(Lookback::SixMonths),
            "1y" => Ok(Lookback::OneYear),
            "2y" => Ok(Lookback::TwoYears),
            "5y" => Ok(Lookback::FiveYears),
            other => Err(ScreenerError::invalid_parameter(
                "period",
                format!("unknown period '{other}' (expected 6mo, 1y, 2y or 5y)"),
            )),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarInterval {
    #[default]
    Daily,
    Weekly,
}

impl FromStr for BarInterval {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(BarInterval::Daily),
            "1wk" => Ok(BarInterval::Weekly),
            other => Err(ScreenerError::invalid_parameter(
                "interval",
                format!("unknown interval '{other}' (expected 1d or 1wk)"),
            )),
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarInterval::Daily => f.write_str("1d"),
            BarInterval::Weekly => f.write_str("1wk"),
        }
    }
}

/// Source of historical bars. Implementations report every failure as
/// `DataUnavailable`.
pub trait MarketDataPort: Sync {
    fn fetch_bars(
        &self,
        ticker: &str,
        lookback: Lookback,
        interval: BarInterval,
    ) -> Result<PriceSeries, ScreenerError>;

    fn list_tickers(&self) -> Result<Vec<String>, ScreenerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lookback() {
        assert_eq!("6mo".parse::<Lookback>().unwrap(), Lookback::SixMonths);
        assert_eq!("5y".parse::<Lookback>().unwrap(), Lookback::FiveYears);
        assert!("3y".parse::<Lookback>().is_err());
        assert_eq!(Lookback::TwoYears.to_string(), "2y");
    }

    #[test]
    fn parse_interval() {
        assert_eq!("1d".parse::<BarInterval>().unwrap(), BarInterval::Daily);
        assert_eq!("1wk".parse::<BarInterval>().unwrap(), BarInterval::Weekly);
        assert!("1h".parse::<BarInterval>().is_err());
    }

    #[test]
    fn lookback_start_date() {
        let last = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        assert_eq!(
            Lookback::SixMonths.start_from(last),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            Lookback::OneYear.start_from(last),
            NaiveDate::from_ymd_opt(2023, 8, 31).unwrap()
        );
    }
}
