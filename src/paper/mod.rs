//! Paper trading chain
//!
//! An in-memory stand-in for the wallet, provider and AMM:
//! - Balances and spendable coin counts per asset, in base units
//! - Constant-product pools keyed by [`PoolId`] with a 0.3% LP fee
//! - A block height that advances by one per submitted transaction
//! - A fixed network fee charged in the base asset, even on revert
//!
//! SECURITY NOTE: nothing here signs or broadcasts real transactions.

mod pool;

pub use pool::{get_amount_out, Reserves, SWAP_FEE_BPS};

use alloy::primitives::B256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::execution::{
    AmmClient, BlockHeader, Coin, PoolId, ProviderError, Receipt, SwapRequest, TransactionHandle,
    TransactionResult, TransactionStatus, TxParams, WalletProvider,
};
use crate::tokens::TokenRegistry;

/// Default network fee per transaction (0.000001 ETH)
pub const DEFAULT_TX_FEE: u64 = 1_000;

/// Inputs a single transaction may spend before the node refuses it
pub const MAX_INPUTS: usize = 255;

const PAPER_ADDRESS: &str = "0x000000000000000000000000000000000000000000000000000000000000face";

#[derive(Debug, Default)]
struct ChainState {
    balances: HashMap<B256, u64>,
    coin_counts: HashMap<B256, usize>,
    pools: HashMap<PoolId, Reserves>,
    height: u32,
    submitted: u64,
}

impl ChainState {
    fn balance(&self, asset: &B256) -> u64 {
        self.balances.get(asset).copied().unwrap_or(0)
    }

    fn credit(&mut self, asset: B256, amount: u64) {
        let balance = self.balances.entry(asset).or_insert(0);
        *balance = balance.saturating_add(amount);
        *self.coin_counts.entry(asset).or_insert(0) += 1;
    }

    fn debit(&mut self, asset: B256, amount: u64) {
        let balance = self.balances.entry(asset).or_insert(0);
        *balance = balance.saturating_sub(amount);
        // spending merges the inputs into a single change coin
        let coins = if *balance > 0 { 1 } else { 0 };
        self.coin_counts.insert(asset, coins);
    }

    /// Walk `pools` from `asset_in`, returning every hop's `(asset, amount)`
    fn amounts_out(
        &self,
        asset_in: B256,
        amount_in: u64,
        pools: &[PoolId],
    ) -> Result<Vec<(B256, u64)>, ProviderError> {
        let mut path = vec![(asset_in, amount_in)];
        let (mut asset, mut amount) = (asset_in, amount_in);
        for pool in pools {
            let reserves = self
                .pools
                .get(pool)
                .ok_or_else(|| ProviderError::Rpc(format!("PoolDoesNotExist: {}", pool)))?;
            let next = pool
                .other(&asset)
                .ok_or_else(|| ProviderError::Rpc(format!("PoolDoesNotExist: {}", pool)))?;
            amount = reserves.amount_out(pool, &asset, amount);
            asset = next;
            path.push((asset, amount));
        }
        Ok(path)
    }
}

struct Inner {
    state: RwLock<ChainState>,
    base_asset: B256,
    fee: u64,
    connected: AtomicBool,
    reject_next: AtomicBool,
}

/// Shared handle to the paper chain
#[derive(Clone)]
pub struct PaperChain {
    inner: Arc<Inner>,
}

impl PaperChain {
    /// Empty chain whose fees are paid in `base_asset`
    pub fn new(base_asset: B256) -> Self {
        Self::with_fee(base_asset, DEFAULT_TX_FEE)
    }

    pub fn with_fee(base_asset: B256, fee: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(ChainState::default()),
                base_asset,
                fee,
                connected: AtomicBool::new(true),
                reject_next: AtomicBool::new(false),
            }),
        }
    }

    /// Chain seeded with starting balances and ETH pools for every registry token
    ///
    /// Pools are priced from the market fallback prices: ETH 2000, FUEL 0.05, USDC 1.
    pub async fn demo(tokens: &TokenRegistry) -> Self {
        let native = *tokens.native();
        let chain = Self::new(native.asset_id);
        chain.set_balance(native.asset_id, 1_000_000_000).await;

        for token in tokens.all().iter().filter(|t| !t.is_native) {
            let (wallet_units, pool_units) = match token.symbol {
                "FUEL" => (1_000, 4_000_000),
                "USDC" => (1_000, 200_000),
                _ => (10, 2_000),
            };
            let scale = 10u64.pow(token.decimals as u32);
            chain
                .set_balance(token.asset_id, wallet_units * scale)
                .await;
            chain
                .add_pool(
                    native.asset_id,
                    100 * 1_000_000_000,
                    token.asset_id,
                    pool_units * scale,
                )
                .await;
        }
        chain
    }

    pub fn base_asset(&self) -> B256 {
        self.inner.base_asset
    }

    pub fn fee(&self) -> u64 {
        self.inner.fee
    }

    pub async fn set_balance(&self, asset: B256, amount: u64) {
        let mut state = self.inner.state.write().await;
        state.balances.insert(asset, amount);
        state.coin_counts.insert(asset, if amount > 0 { 1 } else { 0 });
    }

    /// Split the balance of `asset` into `count` coins
    pub async fn set_coin_count(&self, asset: B256, count: usize) {
        self.inner.state.write().await.coin_counts.insert(asset, count);
    }

    /// Create (or replace) the volatile pool for a pair
    pub async fn add_pool(&self, a: B256, reserve_a: u64, b: B256, reserve_b: u64) -> PoolId {
        let pool = PoolId::volatile(a, b);
        let reserves = Reserves::for_pool(&pool, a, reserve_a, reserve_b);
        self.inner.state.write().await.pools.insert(pool, reserves);
        pool
    }

    pub async fn balance(&self, asset: &B256) -> u64 {
        self.inner.state.read().await.balance(asset)
    }

    pub async fn reserves(&self, pool: &PoolId) -> Option<Reserves> {
        self.inner.state.read().await.pools.get(pool).copied()
    }

    pub async fn height(&self) -> u32 {
        self.inner.state.read().await.height
    }

    pub async fn advance_blocks(&self, blocks: u32) {
        let mut state = self.inner.state.write().await;
        state.height = state.height.saturating_add(blocks);
    }

    /// Transactions that reached the chain, settled or reverted
    pub async fn submitted(&self) -> u64 {
        self.inner.state.read().await.submitted
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::SeqCst);
    }

    /// Decline the next signing request as if the user pressed reject
    pub fn reject_next(&self) {
        self.inner.reject_next.store(true, Ordering::SeqCst);
    }

    async fn settle(&self, request: &SwapRequest) -> TransactionResult {
        let mut state = self.inner.state.write().await;
        state.height = state.height.saturating_add(1);
        state.submitted += 1;
        let id = transaction_id(state.submitted, request);
        let base = self.inner.base_asset;
        let fee = self.inner.fee.min(state.balance(&base));

        let outcome = self.check_swap(&state, request);
        state.debit(base, fee);
        let mut receipts = vec![Receipt {
            asset_id: base,
            amount: fee,
            incoming: false,
        }];

        let status = match outcome {
            Ok((pool, asset_out, amount_out)) => {
                state.debit(request.asset_in, request.amount_in);
                state.credit(asset_out, amount_out);
                if let Some(reserves) = state.pools.get_mut(&pool) {
                    reserves.apply(&pool, &request.asset_in, request.amount_in, amount_out);
                }
                receipts.push(Receipt {
                    asset_id: request.asset_in,
                    amount: request.amount_in,
                    incoming: false,
                });
                receipts.push(Receipt {
                    asset_id: asset_out,
                    amount: amount_out,
                    incoming: true,
                });
                tracing::debug!(%id, amount_in = request.amount_in, amount_out, "Paper swap settled");
                TransactionStatus::Success
            }
            Err(reason) => {
                tracing::debug!(%id, %reason, "Paper swap reverted");
                TransactionStatus::Failure(reason)
            }
        };

        TransactionResult {
            id,
            fee,
            receipts,
            status,
        }
    }

    /// Validate a swap against the current state: `(pool, asset_out, amount_out)`
    fn check_swap(
        &self,
        state: &ChainState,
        request: &SwapRequest,
    ) -> Result<(PoolId, B256, u64), String> {
        if request.deadline <= state.height {
            return Err("DeadlineExpired".to_string());
        }
        let pool = match request.pools.as_slice() {
            [pool] => *pool,
            _ => return Err("PoolDoesNotExist: single-hop swaps only".to_string()),
        };
        let path = state
            .amounts_out(request.asset_in, request.amount_in, &[pool])
            .map_err(|e| e.to_string())?;
        let (asset_out, amount_out) = path[path.len() - 1];
        if amount_out < request.min_amount_out {
            return Err(format!(
                "InsufficientOutputAmount: {} < {}",
                amount_out, request.min_amount_out
            ));
        }

        let mut needed = request.amount_in;
        if request.asset_in == self.inner.base_asset {
            needed = needed.saturating_add(self.inner.fee);
        }
        let available = state.balance(&request.asset_in);
        if available < needed {
            return Err(format!("NotEnoughBalance: have {}, need {}", available, needed));
        }
        Ok((pool, asset_out, amount_out))
    }
}

fn transaction_id(nonce: u64, request: &SwapRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&nonce.to_le_bytes());
    hasher.update(request.asset_in.as_slice());
    hasher.update(&request.amount_in.to_le_bytes());
    hasher.update(&request.deadline.to_le_bytes());
    format!("0x{}", hasher.finalize().to_hex())
}

/// Already-settled paper transaction
struct PaperTransaction {
    result: TransactionResult,
}

#[async_trait]
impl TransactionHandle for PaperTransaction {
    fn id(&self) -> &str {
        &self.result.id
    }

    async fn wait_for_result(&self) -> Result<TransactionResult, ProviderError> {
        Ok(self.result.clone())
    }
}

#[async_trait]
impl WalletProvider for PaperChain {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn address(&self) -> String {
        PAPER_ADDRESS.to_string()
    }

    async fn get_balance(&self, asset_id: Option<B256>) -> Result<u64, ProviderError> {
        let asset = asset_id.unwrap_or(self.inner.base_asset);
        Ok(self.balance(&asset).await)
    }

    async fn get_coins(&self, owner: &str) -> Result<Vec<Coin>, ProviderError> {
        if owner != PAPER_ADDRESS {
            return Ok(Vec::new());
        }
        let state = self.inner.state.read().await;
        let mut coins = Vec::new();
        for (asset, balance) in &state.balances {
            let count = state.coin_counts.get(asset).copied().unwrap_or(0);
            if *balance == 0 || count == 0 {
                continue;
            }
            let count_u64 = count as u64;
            let share = balance / count_u64;
            let remainder = balance % count_u64;
            for i in 0..count_u64 {
                coins.push(Coin {
                    asset_id: *asset,
                    amount: if i == 0 { share + remainder } else { share },
                });
            }
        }
        Ok(coins)
    }

    async fn latest_block(&self) -> Result<BlockHeader, ProviderError> {
        Ok(BlockHeader {
            height: self.height().await,
        })
    }

    async fn send_transaction(
        &self,
        request: SwapRequest,
    ) -> Result<Box<dyn TransactionHandle>, ProviderError> {
        if !self.is_connected() {
            return Err(ProviderError::Rpc("wallet is not connected".to_string()));
        }
        if self.inner.reject_next.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::UserRejected);
        }
        let result = self.settle(&request).await;
        Ok(Box::new(PaperTransaction { result }))
    }
}

#[async_trait]
impl AmmClient for PaperChain {
    async fn get_amounts_out(
        &self,
        asset_in: B256,
        amount_in: u64,
        pools: &[PoolId],
    ) -> Result<Vec<(B256, u64)>, ProviderError> {
        self.inner
            .state
            .read()
            .await
            .amounts_out(asset_in, amount_in, pools)
    }

    async fn build_swap(
        &self,
        amount_in: u64,
        asset_in: B256,
        min_amount_out: u64,
        pools: &[PoolId],
        deadline: u32,
        params: TxParams,
    ) -> Result<SwapRequest, ProviderError> {
        let state = self.inner.state.read().await;
        for pool in pools {
            if !state.pools.contains_key(pool) {
                return Err(ProviderError::Rpc(format!("PoolDoesNotExist: {}", pool)));
            }
        }

        let coins = state.coin_counts.get(&asset_in).copied().unwrap_or(0);
        if coins > MAX_INPUTS {
            return Err(ProviderError::Rpc(format!(
                "Validity(MAX_INPUTS_EXCEEDED): {} coins",
                coins
            )));
        }
        let available = state.balance(&asset_in);
        if available < amount_in {
            return Err(ProviderError::Rpc(format!(
                "NotEnoughBalance: have {}, need {}",
                available, amount_in
            )));
        }

        Ok(SwapRequest {
            amount_in,
            asset_in,
            min_amount_out,
            pools: pools.to_vec(),
            deadline,
            params,
        })
    }
}
