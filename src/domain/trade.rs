//! Round-trip trade reconstruction from a signal series.
//!
//! Long-only: a Sell closes an open long but never opens a short trade. A long
//! still open on the final bar is dropped, not force-closed.

use crate::domain::signal::{Signal, SignalRow};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl_percent: f64,
    pub win: bool,
}

impl Trade {
    pub fn close(
        entry_date: NaiveDate,
        entry_price: f64,
        exit_date: NaiveDate,
        exit_price: f64,
    ) -> Self {
        let pnl_percent = (exit_price - entry_price) / entry_price * 100.0;
        Trade {
            entry_date,
            entry_price,
            exit_date,
            exit_price,
            pnl_percent,
            win: pnl_percent > 0.0,
        }
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeState {
    Flat,
    Long {
        entry_date: NaiveDate,
        entry_price: f64,
    },
}

impl TradeState {
    /// Applies one bar. Returns the next state and the trade closed on this
    /// bar, if any. Signals that do not fit the current state are ignored.
    pub fn step(self, row: &SignalRow) -> (TradeState, Option<Trade>) {
        match (self, row.signal) {
            (TradeState::Flat, Signal::Buy) => (
                TradeState::Long {
                    entry_date: row.date,
                    entry_price: row.close,
                },
                None,
            ),
            (
                TradeState::Long {
                    entry_date,
                    entry_price,
                },
                Signal::Sell,
            ) => (
                TradeState::Flat,
                Some(Trade::close(entry_date, entry_price, row.date, row.close)),
            ),
            (state, _) => (state, None),
        }
    }
}

pub fn extract_trades(rows: &[SignalRow]) -> Vec<Trade> {
    let (_, trades) = rows.iter().fold(
        (TradeState::Flat, Vec::new()),
        |(state, mut trades), row| {
            let (next, closed) = state.step(row);
            trades.extend(closed);
            (next, trades)
        },
    );
    trades
}
