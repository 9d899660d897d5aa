//! Trade execution
//!
//! - [`TradeExecutor`]: validate, quote, build, submit and settle one swap at a time
//! - [`QuoteService`]: AMM output estimate minus the slippage tolerance
//! - [`ActionPolicy`]: which actions may currently execute
//! - [`classify`]: raw wallet/provider failures mapped onto [`TradeError`]
//!
//! The chain is reached only through [`WalletProvider`] and [`AmmClient`].

mod audit;
mod error;
mod executor;
mod policy;
mod pool;
mod provider;
mod quote;
pub mod units;

pub use audit::{AuditStatus, ExecutionAuditLog};
pub use error::{classify, ErrorKind, ProviderError, TradeError};
pub use executor::{ExecutionState, Outcome, TradeExecutor, TransactionDetails};
pub use policy::ActionPolicy;
pub use pool::PoolId;
pub use provider::{
    AmmClient, BlockHeader, Coin, Receipt, SwapRequest, TransactionHandle, TransactionResult,
    TransactionStatus, TxParams, WalletProvider,
};
pub use quote::{apply_slippage, Quote, QuoteService};
