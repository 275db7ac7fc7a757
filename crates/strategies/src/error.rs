// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid strategy settings: {0}")]
    InvalidSettings(String),

    #[error("Strategy analysis failed: {0}")]
    Analysis(String),
}

pub type Result<T> = std::result::Result<T, Error>;
