// In crates/analytics/src/types.rs

use chrono::{DateTime, Utc};
use core_types::Side;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

/// A complete record of a single closed trade, from entry to exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub pnl: Decimal,
}

/// A struct to hold a point in the account's equity curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// A report of a strategy's performance over a simulated period.
///
/// Degenerate values are deliberate: a run with no trades carries a NaN win
/// rate and profit factor, and a run with no losing trades carries an
/// infinite profit factor. Consumers render them as `n/a` instead of
/// mistaking them for real zeros.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceReport {
    pub total_return_percentage: f64,
    pub net_pnl: Decimal,
    /// Largest peak-to-trough decline as a fraction of the peak, in [0, 1].
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Winning trades over total trades, as a fraction.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: u32,
}

impl PerformanceReport {
    /// Creates a new, empty report with default zero values.
    pub fn new() -> Self {
        Self::default()
    }
}
