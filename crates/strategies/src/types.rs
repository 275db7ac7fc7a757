// In crates/strategies/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)] // Clone is needed for the sweep workers
pub struct GridSettings {
    // Anchor price the ladder is built around.
    pub reference_price: Decimal,

    // Spacing between adjacent ladder levels, in percent.
    pub grid_spacing_percent: f64,

    // Number of levels in the ladder.
    pub grid_count: u32,

    // The confidence score to assign to signals from this strategy
    pub confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MacdSettings {
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,

    // The confidence score to assign to signals from this strategy
    pub confidence: f64,
}
