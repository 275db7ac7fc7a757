// In crates/strategies/src/lib.rs

use core_types::{MarketBar, Signal};

pub mod error;
pub mod grid;
pub mod macd;
pub mod types;

pub use error::{Error, Result};
pub use grid::GridStrategy;
pub use macd::MacdStrategy;

/// The universal interface for a trading strategy.
///
/// A strategy is responsible for analyzing market data and producing a trading
/// `Signal`. It is a stateful entity: it may keep indicator values or its own
/// history across calls, while the engine only ever hands it the trailing
/// window of recent bars.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Produce a signal for the last bar of `window`.
    ///
    /// Insufficient history is not an error; strategies emit a low-confidence
    /// Hold instead. An `Err` here is a strategy fault and aborts the run.
    fn analyze(&mut self, window: &[MarketBar]) -> Result<Signal>;
}
