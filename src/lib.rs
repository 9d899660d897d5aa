//! Persona Trader
//!
//! Personality-driven trading agents for the Fuel network:
//! - Chat with a scripted personality that turns market data and free-text
//!   commands into bounded, validated trade proposals
//! - Fall back to a deterministic simulated responder when no generative backend
//!   is configured or it fails
//! - Execute approved proposals through a single-flight swap state machine with
//!   slippage protection, deadlines, gas checks and failure classification
//!
//! # Safety Model
//!
//! - Malformed generative output degrades to `hold`, never to an unbounded trade
//! - One execution in flight per session; nothing is retried automatically
//! - The CLI trades only against the in-memory paper chain

pub mod agent;
pub mod config;
pub mod execution;
pub mod market;
pub mod notify;
pub mod paper;
pub mod session;
pub mod tokens;

mod error;

// Re-export commonly used types
pub use agent::{DecisionEngine, Personality, TradeAction, TradeDecision};
pub use config::{Config, Network, OPENAI_API_KEY_ENV};
pub use error::{Error, Result};
pub use execution::{Outcome, TradeExecutor};
pub use market::{MarketDataFeed, MarketSnapshot};
pub use session::TradingSession;
