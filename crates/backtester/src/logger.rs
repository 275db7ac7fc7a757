// In crates/backtester/src/logger.rs

use analytics::types::{EquityPoint, Trade};
use chrono::{DateTime, TimeZone, Utc};
use core_types::{Position, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A logger responsible for recording trades and equity changes during a backtest.
#[derive(Debug, Default)]
pub struct TradeLogger {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl TradeLogger {
    /// Creates a new, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a point in the equity curve.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, value: Decimal) {
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Records a completed trade by combining the entry position with the
    /// closing price, and returns the realized P&L.
    pub fn record_trade(
        &mut self,
        open_pos: &Position,
        exit_price: Decimal,
        exit_time: i64,
    ) -> Decimal {
        let direction = if open_pos.side == Side::Long {
            dec!(1)
        } else {
            dec!(-1)
        };
        let pnl = (exit_price - open_pos.entry_price) * open_pos.quantity * direction;

        self.trades.push(Trade {
            side: open_pos.side,
            entry_time: Utc.timestamp_millis_opt(open_pos.entry_time).unwrap(),
            exit_time: Utc.timestamp_millis_opt(exit_time).unwrap(),
            entry_price: open_pos.entry_price,
            exit_price,
            quantity: open_pos.quantity,
            pnl,
        });

        pnl
    }
}
