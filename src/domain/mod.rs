//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod signal;
pub mod backtest;
pub mod trade;
pub mod metrics;
pub mod analysis;
pub mod universe;
pub mod screener;
pub mod config_validation;
pub mod error;
