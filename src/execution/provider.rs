//! Wallet and AMM collaborator interfaces
//!
//! The executor only talks to the chain through these traits; the in-memory
//! [`crate::paper::PaperChain`] implements both sides for paper trading and tests.

use alloy::primitives::B256;
use async_trait::async_trait;
use serde::Serialize;

use super::{PoolId, ProviderError};

/// A spendable unit of one asset owned by the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coin {
    pub asset_id: B256,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u32,
}

/// Transaction policy parameters attached to a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxParams {
    pub gas_limit: u64,
}

/// Swap request produced by the AMM writer, ready to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRequest {
    pub amount_in: u64,
    pub asset_in: B256,
    pub min_amount_out: u64,
    pub pools: Vec<PoolId>,
    /// Last block height at which the swap may execute
    pub deadline: u32,
    pub params: TxParams,
}

/// Asset movement observed in a settled transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub asset_id: B256,
    pub amount: u64,
    /// `true` when the wallet received the amount, `false` when it was spent
    pub incoming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failure(String),
}

/// Settlement result of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub id: String,
    /// Realized fee in fee-asset base units
    pub fee: u64,
    pub receipts: Vec<Receipt>,
    pub status: TransactionStatus,
}

impl TransactionResult {
    /// Total amount of `asset_id` received by the wallet
    pub fn received(&self, asset_id: &B256) -> u64 {
        self.receipts
            .iter()
            .filter(|r| r.incoming && r.asset_id == *asset_id)
            .map(|r| r.amount)
            .sum()
    }
}

/// Tracks a submitted transaction by its network id
#[async_trait]
pub trait TransactionHandle: Send + Sync {
    fn id(&self) -> &str;

    async fn wait_for_result(&self) -> Result<TransactionResult, ProviderError>;
}

/// Connected wallet and its provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn is_connected(&self) -> bool;

    fn address(&self) -> String;

    /// Balance in base units; `None` means the fee asset
    async fn get_balance(&self, asset_id: Option<B256>) -> Result<u64, ProviderError>;

    async fn get_coins(&self, owner: &str) -> Result<Vec<Coin>, ProviderError>;

    async fn latest_block(&self) -> Result<BlockHeader, ProviderError>;

    /// Sign and submit; rejection in the wallet surfaces as [`ProviderError::UserRejected`]
    async fn send_transaction(
        &self,
        request: SwapRequest,
    ) -> Result<Box<dyn TransactionHandle>, ProviderError>;
}

/// AMM reader and writer
#[async_trait]
pub trait AmmClient: Send + Sync {
    /// Expected outputs along `pools` as `(asset, amount)` pairs
    async fn get_amounts_out(
        &self,
        asset_in: B256,
        amount_in: u64,
        pools: &[PoolId],
    ) -> Result<Vec<(B256, u64)>, ProviderError>;

    async fn build_swap(
        &self,
        amount_in: u64,
        asset_in: B256,
        min_amount_out: u64,
        pools: &[PoolId],
        deadline: u32,
        params: TxParams,
    ) -> Result<SwapRequest, ProviderError>;
}
