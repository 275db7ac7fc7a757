// In crates/risk/src/lib.rs

use core_types::{MarketBar, Position, Signal};
use rust_decimal::Decimal;

pub mod account_manager;
pub mod error;
pub mod sizer;
pub mod types;

// Re-export public types
pub use account_manager::AccountRiskManager;
pub use error::{Error, Result};
pub use sizer::PositionSizer;
pub use types::{RiskSettings, SizerSettings, SizingMethod};

/// The universal interface for a risk management module.
///
/// A `RiskManager` is responsible for evaluating a trading `Signal` against a
/// set of account-level risk rules and, if approved, granting a risk budget
/// for the trade.
pub trait RiskManager {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    /// Evaluates a signal against the account state.
    ///
    /// # Arguments
    ///
    /// * `capital`: The account equity at the time of the signal.
    /// * `signal`: The trading `Signal` produced by a strategy.
    /// * `open_position`: An `Option` containing the currently open position,
    ///   if one exists.
    /// * `window`: The trailing market window the signal was formed on, used
    ///   for volatility estimation.
    ///
    /// # Returns
    ///
    /// * `Ok(risk_amount)`: The approved risk budget as a fraction of equity.
    /// * `Err(Error::Vetoed)`: If the signal is rejected due to a risk rule
    ///   violation.
    ///
    /// The manager updates its internal per-day and drawdown state on every
    /// call, including calls that end in a veto.
    fn evaluate(
        &mut self,
        capital: Decimal,
        signal: &Signal,
        open_position: Option<&Position>,
        window: &[MarketBar],
    ) -> Result<f64>;
}
