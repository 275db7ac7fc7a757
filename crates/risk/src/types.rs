// In crates/risk/src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)] // Clone is needed for the sweep workers
#[serde(default)]
pub struct RiskSettings {
    // Cap on any single position, as a fraction of account equity.
    pub max_position_size: f64,

    // Drawdown fraction from starting equity that halts the account for the
    // rest of the run once breached.
    pub max_drawdown: f64,

    // Loss fraction from the day's starting equity that suspends trading for
    // the rest of that day.
    pub max_daily_loss: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_position_size: 0.1,
            max_drawdown: 0.2,
            max_daily_loss: 0.05,
        }
    }
}

/// How the position sizer turns an approved risk budget into an order size.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMethod {
    Fixed,
    Kelly,
    // Unrecognized method names degrade to risk-based sizing rather than
    // failing the run.
    #[default]
    #[serde(other)]
    RiskBased,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SizerSettings {
    // Bounds on any single order, as fractions of account equity.
    pub max_position_size: f64,
    pub min_position_size: f64,

    // Fraction of equity committed per trade by the fixed policy.
    pub default_risk_per_trade: f64,

    pub method: SizingMethod,

    // Kelly placeholders, used until a trade history exists to estimate from.
    pub kelly_win_rate: f64,
    pub kelly_win_loss_ratio: f64,
}

impl Default for SizerSettings {
    fn default() -> Self {
        Self {
            max_position_size: 0.1,
            min_position_size: 0.01,
            default_risk_per_trade: 0.02,
            method: SizingMethod::RiskBased,
            kelly_win_rate: 0.5,
            kelly_win_loss_ratio: 1.5,
        }
    }
}
