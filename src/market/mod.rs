//! Market data collaborators
//!
//! - [`MarketDataFeed`]: cached per-symbol snapshots, price history, polling subscriptions
//! - [`PriceSource`]: USD spot price lookup (CoinGecko over QuickNode)
//! - [`WhaleTracker`]: recent large transactions for narrative context

pub mod feed;
pub mod snapshot;
pub mod source;
pub mod subscriptions;
pub mod whale;

use thiserror::Error;

pub use feed::MarketDataFeed;
pub use snapshot::{MarketSnapshot, PricePoint};
pub use source::{PriceSource, QuickNodePriceSource, UnavailablePriceSource};
pub use subscriptions::{Subscription, SubscriptionRegistry};
pub use whale::{WhaleTracker, WhaleTransaction};

/// Market data retrieval failure
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Token {0} not supported")]
    UnsupportedToken(String),

    #[error("Price source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Unexpected price response: {0}")]
    BadResponse(String),

    #[error("Invalid price endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}
