//! Error types for the persona trading agent

use thiserror::Error;

use crate::agent::BackendError;
use crate::execution::TradeError;
use crate::market::MarketError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Generative backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Market data error: {0}")]
    Market(#[from] MarketError),

    #[error("Trade execution failed: {0}")]
    Execution(#[from] TradeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
