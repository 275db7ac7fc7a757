// In crates/core-types/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single historical observation of the traded instrument: a
/// unix-millisecond timestamp and the price at that instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub timestamp: i64,
    pub price: Decimal,
}

/// What a strategy proposes the engine do at a given bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// The direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

/// A strategy's proposal for the current bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    /// Strategy conviction in the proposal, in `[0.0, 1.0]`.
    pub confidence: f64,
    /// The price the proposal was formed at (the current bar's price).
    pub price: Decimal,
    /// The current bar's timestamp, unix milliseconds.
    pub timestamp: i64,
}

impl Signal {
    pub fn buy(confidence: f64, price: Decimal, timestamp: i64) -> Self {
        Self {
            action: Action::Buy,
            confidence,
            price,
            timestamp,
        }
    }

    pub fn sell(confidence: f64, price: Decimal, timestamp: i64) -> Self {
        Self {
            action: Action::Sell,
            confidence,
            price,
            timestamp,
        }
    }

    /// A no-op signal. Hold carries a neutral confidence of 0.5.
    pub fn hold(price: Decimal, timestamp: i64) -> Self {
        Self {
            action: Action::Hold,
            confidence: 0.5,
            price,
            timestamp,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

/// A position held by the engine between an entry fill and its close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: Decimal,
    /// Entry bar timestamp, unix milliseconds.
    pub entry_time: i64,
    pub quantity: Decimal,
}
