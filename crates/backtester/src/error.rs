// In crates/backtester/src/error.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Historical data is empty")]
    EmptyHistory,

    #[error("Initial capital must be positive, got {0}")]
    InvalidCapital(Decimal),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Bar {index} is earlier than its predecessor")]
    OutOfOrderBar { index: usize },

    #[error("Strategy failed: {0}")]
    Strategy(#[from] strategies::Error),

    #[error("Risk configuration rejected: {0}")]
    Risk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
