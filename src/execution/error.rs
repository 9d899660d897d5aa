//! Trade execution failures and their classification

use serde::Serialize;
use thiserror::Error;

use super::units::format_units;

/// Raw failure reported by a wallet, provider or AMM collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("user rejected the request")]
    UserRejected,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),
}

/// Fieldless failure category surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    WalletNotConnected,
    UnknownToken,
    InvalidPair,
    ActionDisabled,
    InsufficientGas,
    QuoteUnavailable,
    FragmentedFunds,
    InsufficientBalance,
    UserRejected,
    PoolNotFound,
    SlippageExceeded,
    ExecutionInProgress,
    UnknownError,
}

fn eth(units: &u64) -> String {
    format_units(*units, 9)
}

/// Classified execution failure
///
/// Every variant is terminal for the current attempt; the executor returns to
/// idle and nothing is retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("Please connect your wallet")]
    WalletNotConnected,

    #[error("Token configuration not found for {0}")]
    UnknownToken(String),

    #[error("Cannot trade {0} against itself, it is the network fee asset")]
    InvalidPair(String),

    #[error("{action} is temporarily disabled: {reason}")]
    ActionDisabled { action: String, reason: String },

    #[error(
        "Insufficient ETH for gas: have {} ETH, need {} ETH (short {} ETH)",
        eth(.available),
        eth(.required),
        eth(.shortfall)
    )]
    InsufficientGas {
        /// Base units of the fee asset
        required: u64,
        available: u64,
        shortfall: u64,
    },

    #[error("No quote available: {0}")]
    QuoteUnavailable(String),

    #[error(
        "UTXO Fragmentation Issue: Your {symbol} is split into too many small UTXOs. \
         Try sending yourself all your {symbol} in a single transaction to consolidate funds."
    )]
    FragmentedFunds { symbol: String },

    #[error("Insufficient {symbol} balance for this trade: {detail}")]
    InsufficientBalance { symbol: String, detail: String },

    #[error("Transaction was rejected in the wallet")]
    UserRejected,

    #[error("Liquidity pool not found: {0}")]
    PoolNotFound(String),

    #[error("Price moved beyond slippage tolerance: {0}")]
    SlippageExceeded(String),

    #[error("Another trade is already executing")]
    ExecutionInProgress,

    #[error("Swap failed: {0}")]
    Unknown(String),
}

impl TradeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TradeError::WalletNotConnected => ErrorKind::WalletNotConnected,
            TradeError::UnknownToken(_) => ErrorKind::UnknownToken,
            TradeError::InvalidPair(_) => ErrorKind::InvalidPair,
            TradeError::ActionDisabled { .. } => ErrorKind::ActionDisabled,
            TradeError::InsufficientGas { .. } => ErrorKind::InsufficientGas,
            TradeError::QuoteUnavailable(_) => ErrorKind::QuoteUnavailable,
            TradeError::FragmentedFunds { .. } => ErrorKind::FragmentedFunds,
            TradeError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            TradeError::UserRejected => ErrorKind::UserRejected,
            TradeError::PoolNotFound(_) => ErrorKind::PoolNotFound,
            TradeError::SlippageExceeded(_) => ErrorKind::SlippageExceeded,
            TradeError::ExecutionInProgress => ErrorKind::ExecutionInProgress,
            TradeError::Unknown(_) => ErrorKind::UnknownError,
        }
    }
}

/// Error signatures of a transaction that cannot gather enough inputs
const FRAGMENTATION_SIGNATURES: &[&str] = &[
    "Insufficient funds or too many small value coins",
    "MAX_INPUTS_EXCEEDED",
    "INSUFFICIENT_FUNDS",
    "too many small value coins",
];

/// Error signatures of a plain balance shortfall
const BALANCE_SIGNATURES: &[&str] = &["NotEnoughBalance", "not enough balance"];

const REJECTION_SIGNATURES: &[&str] = &["user rejected", "rejected by user", "request rejected"];

const POOL_SIGNATURES: &[&str] = &["PoolDoesNotExist", "pool not found"];

const SLIPPAGE_SIGNATURES: &[&str] = &["InsufficientOutputAmount", "slippage"];

/// Map a raw collaborator failure onto the execution taxonomy
///
/// `symbol` names the asset being spent, for the fragmentation hint.
pub fn classify(error: &ProviderError, symbol: &str) -> TradeError {
    let message = match error {
        ProviderError::UserRejected => return TradeError::UserRejected,
        ProviderError::Rpc(m) | ProviderError::Reverted(m) => m.as_str(),
    };
    let lower = message.to_lowercase();

    if FRAGMENTATION_SIGNATURES.iter().any(|s| message.contains(s)) {
        TradeError::FragmentedFunds {
            symbol: symbol.to_string(),
        }
    } else if BALANCE_SIGNATURES
        .iter()
        .any(|s| lower.contains(&s.to_lowercase()))
    {
        TradeError::InsufficientBalance {
            symbol: symbol.to_string(),
            detail: message.to_string(),
        }
    } else if REJECTION_SIGNATURES.iter().any(|s| lower.contains(s)) {
        TradeError::UserRejected
    } else if POOL_SIGNATURES.iter().any(|s| lower.contains(&s.to_lowercase())) {
        TradeError::PoolNotFound(message.to_string())
    } else if SLIPPAGE_SIGNATURES
        .iter()
        .any(|s| lower.contains(&s.to_lowercase()))
    {
        TradeError::SlippageExceeded(message.to_string())
    } else {
        TradeError::Unknown(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragmentation_signatures() {
        for raw in [
            "Insufficient funds or too many small value coins",
            "Validity(MAX_INPUTS_EXCEEDED)",
            "revert: INSUFFICIENT_FUNDS",
            "there are too many small value coins",
        ] {
            let err = classify(&ProviderError::Rpc(raw.to_string()), "FUEL");
            assert_eq!(err.kind(), ErrorKind::FragmentedFunds, "{}", raw);
        }
        let err = classify(&ProviderError::Rpc("MAX_INPUTS_EXCEEDED".into()), "FUEL");
        assert!(err.to_string().contains("Your FUEL is split"));
    }

    #[test]
    fn test_balance_shortfall_is_not_fragmentation() {
        let err = classify(
            &ProviderError::Rpc("NotEnoughBalance: have 1000, need 5000".into()),
            "FUEL",
        );
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(
            err.to_string(),
            "Insufficient FUEL balance for this trade: NotEnoughBalance: have 1000, need 5000"
        );
    }

    #[test]
    fn test_rejection() {
        assert_eq!(
            classify(&ProviderError::UserRejected, "ETH").kind(),
            ErrorKind::UserRejected
        );
        assert_eq!(
            classify(&ProviderError::Rpc("Request rejected by user".into()), "ETH").kind(),
            ErrorKind::UserRejected
        );
    }

    #[test]
    fn test_pool_and_slippage() {
        assert_eq!(
            classify(&ProviderError::Reverted("PoolDoesNotExist".into()), "ETH").kind(),
            ErrorKind::PoolNotFound
        );
        assert_eq!(
            classify(&ProviderError::Reverted("InsufficientOutputAmount".into()), "ETH").kind(),
            ErrorKind::SlippageExceeded
        );
    }

    #[test]
    fn test_unknown_keeps_raw_message() {
        let err = classify(&ProviderError::Rpc("connection reset".into()), "ETH");
        assert_eq!(err, TradeError::Unknown("connection reset".into()));
        assert_eq!(err.to_string(), "Swap failed: connection reset");
    }

    #[test]
    fn test_insufficient_gas_message() {
        let err = TradeError::InsufficientGas {
            required: 50_000,
            available: 20_000,
            shortfall: 30_000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient ETH for gas: have 0.00002 ETH, need 0.00005 ETH (short 0.00003 ETH)"
        );
    }
}
