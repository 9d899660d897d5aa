//! Trade execution state machine
//!
//! `Idle -> Validating -> Quoting -> Building -> Submitting -> AwaitingConfirmation`
//! then `Settled` or `Failed`, and always back to `Idle`. Only one execution may be
//! in flight; a second `execute()` is rejected immediately. Nothing is retried.

use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::units::{from_base_units, to_base_units};
use super::{
    classify, ActionPolicy, AmmClient, ErrorKind, ExecutionAuditLog, PoolId, ProviderError,
    Quote, QuoteService, TradeError, TransactionResult, TransactionStatus, TxParams,
    WalletProvider,
};
use crate::agent::amount::quantize;
use crate::agent::{TradeAction, TradeDecision};
use crate::config::TradingConfig;
use crate::market::MarketDataFeed;
use crate::notify::Notifier;
use crate::tokens::{TokenInfo, TokenRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Idle,
    Validating,
    Quoting,
    Building,
    Submitting,
    AwaitingConfirmation,
    Settled,
    Failed,
}

/// Summary of a settled swap
///
/// `total_cost_eth` is `eth_amount + gas_cost` for buys and `gas_cost` for sells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub hash: String,
    pub action: TradeAction,
    pub token_symbol: String,
    pub token_amount: f64,
    pub eth_amount: f64,
    /// ETH per token
    pub effective_price: f64,
    #[serde(rename = "priceInUSD")]
    pub price_in_usd: f64,
    /// Realized fee in ETH
    pub gas_cost: f64,
    #[serde(rename = "gasCostUSD")]
    pub gas_cost_usd: f64,
    #[serde(rename = "totalCostETH")]
    pub total_cost_eth: f64,
    #[serde(rename = "totalCostUSD")]
    pub total_cost_usd: f64,
}

impl TransactionDetails {
    /// Multi-line human-readable receipt
    pub fn summary(&self) -> String {
        let (verb, eth_verb) = match self.action {
            TradeAction::Sell => ("Sold", "Received"),
            _ => ("Bought", "Spent"),
        };
        let mut out = String::new();
        let _ = writeln!(out, "Transaction: {}", self.hash);
        let _ = writeln!(out, "{}: {} {}", verb, self.token_amount, self.token_symbol);
        let _ = writeln!(out, "ETH {}: {:.6} ETH", eth_verb, self.eth_amount);
        let _ = writeln!(
            out,
            "Price: {:.6} ETH per {} (~${:.2})",
            self.effective_price, self.token_symbol, self.price_in_usd
        );
        let _ = writeln!(
            out,
            "Gas Cost: {:.6} ETH (~${:.2})",
            self.gas_cost, self.gas_cost_usd
        );
        let _ = write!(
            out,
            "Total Cost: {:.6} ETH (~${:.2})",
            self.total_cost_eth, self.total_cost_usd
        );
        out
    }
}

/// Result of one `execute()` call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Settled(TransactionDetails),
    /// Nothing to execute, e.g. a hold decision
    Skipped(String),
    /// The user declined to sign
    Cancelled,
    Failed(TradeError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Settled(_))
    }

    pub fn details(&self) -> Option<&TransactionDetails> {
        match self {
            Outcome::Settled(details) => Some(details),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TradeError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error().map(TradeError::kind)
    }
}

/// Which side of the pool is spent and which is received
#[derive(Debug, Clone, Copy)]
struct Leg {
    spend: TokenInfo,
    receive: TokenInfo,
}

/// Returns the executor to `Idle` however the execution ends
struct IdleGuard<'a> {
    state: &'a watch::Sender<ExecutionState>,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(ExecutionState::Idle);
    }
}

/// Converts approved trade decisions into swaps
pub struct TradeExecutor {
    wallet: Arc<dyn WalletProvider>,
    amm: Arc<dyn AmmClient>,
    quotes: QuoteService,
    tokens: TokenRegistry,
    market: Arc<MarketDataFeed>,
    policy: ActionPolicy,
    config: TradingConfig,
    notifier: Notifier,
    audit: Option<ExecutionAuditLog>,
    state: watch::Sender<ExecutionState>,
}

impl TradeExecutor {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        amm: Arc<dyn AmmClient>,
        tokens: TokenRegistry,
        market: Arc<MarketDataFeed>,
        config: TradingConfig,
    ) -> Self {
        let (state, _) = watch::channel(ExecutionState::Idle);
        Self {
            quotes: QuoteService::new(amm.clone(), config.slippage_bps),
            policy: ActionPolicy::allow_all().with_disabled(&config.disabled_actions),
            wallet,
            amm,
            tokens,
            market,
            config,
            notifier: Notifier::new(),
            audit: None,
            state,
        }
    }

    /// Replace the action policy; configured `disabled_actions` still apply
    pub fn with_policy(mut self, policy: ActionPolicy) -> Self {
        self.policy = policy.with_disabled(&self.config.disabled_actions);
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit_log(mut self, audit: ExecutionAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn state(&self) -> ExecutionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ExecutionState> {
        self.state.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    fn transition(&self, next: ExecutionState) {
        let previous = self.state.send_replace(next);
        debug!(from = ?previous, to = ?next, "Execution state");
    }

    /// Execute `decision`
    ///
    /// Never panics or errors: every condition ends up in the returned [`Outcome`],
    /// and the executor is `Idle` again when this returns.
    pub async fn execute(&self, decision: &TradeDecision) -> Outcome {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ExecutionState::Idle {
                *state = ExecutionState::Validating;
                true
            } else {
                false
            }
        });
        if !claimed {
            warn!(state = ?self.state(), "Execution rejected, another trade is in flight");
            return Outcome::Failed(TradeError::ExecutionInProgress);
        }
        let _idle = IdleGuard { state: &self.state };

        let execution_id = Uuid::new_v4();
        let started = Instant::now();
        if let Some(audit) = &self.audit {
            audit.record_start(execution_id, decision).await;
        }

        let outcome = match self.run(decision).await {
            Ok(Some(details)) => {
                self.transition(ExecutionState::Settled);
                info!(
                    hash = %details.hash,
                    action = %details.action,
                    symbol = %details.token_symbol,
                    amount = details.token_amount,
                    "Trade executed"
                );
                self.notifier.success(
                    "Trade Executed",
                    format!(
                        "Successfully {} {} {}",
                        if decision.action() == TradeAction::Sell {
                            "sold"
                        } else {
                            "bought"
                        },
                        decision.amount(),
                        decision.token().symbol
                    ),
                );
                Outcome::Settled(details)
            }
            Ok(None) => {
                debug!("Hold decision, nothing to execute");
                Outcome::Skipped("hold decision, no trade".to_string())
            }
            Err(TradeError::UserRejected) => {
                info!("Transaction rejected in the wallet");
                self.notifier.warning(
                    "Transaction Rejected",
                    TradeError::UserRejected.to_string(),
                );
                Outcome::Cancelled
            }
            Err(err) => {
                self.transition(ExecutionState::Failed);
                warn!(kind = ?err.kind(), error = %err, "Trade failed");
                self.notifier.error("Trade Failed", err.to_string());
                Outcome::Failed(err)
            }
        };

        if let Some(audit) = &self.audit {
            let duration_ms = started.elapsed().as_millis() as u64;
            audit
                .record_complete(execution_id, decision, &outcome, duration_ms)
                .await;
        }
        outcome
    }

    async fn run(&self, decision: &TradeDecision) -> Result<Option<TransactionDetails>, TradeError> {
        let Some(leg) = self.validate(decision)? else {
            return Ok(None);
        };
        let native = *self.tokens.native();

        let gas_balance = self
            .wallet
            .get_balance(None)
            .await
            .map_err(|e| classify(&e, native.symbol))?;
        if gas_balance < self.config.min_gas_reserve {
            return Err(TradeError::InsufficientGas {
                required: self.config.min_gas_reserve,
                available: gas_balance,
                shortfall: self.config.min_gas_reserve - gas_balance,
            });
        }
        self.warn_if_fragmented(&leg.spend).await;

        self.transition(ExecutionState::Quoting);
        let eth_usd = self.market.get_snapshot(native.symbol).await.price;
        let amount_in = self.amount_in(decision, &leg, eth_usd).await?;
        let pool = PoolId::volatile(leg.spend.asset_id, leg.receive.asset_id);
        let block = self
            .wallet
            .latest_block()
            .await
            .map_err(|e| classify(&e, leg.spend.symbol))?;
        let deadline = block.height.saturating_add(self.config.deadline_blocks);
        let quote = self.quotes.quote(leg.spend.asset_id, amount_in, pool).await?;

        self.transition(ExecutionState::Building);
        let request = self
            .amm
            .build_swap(
                quote.amount_in,
                quote.asset_in,
                quote.min_amount_out,
                &[pool],
                deadline,
                TxParams {
                    gas_limit: self.config.gas_limit,
                },
            )
            .await
            .map_err(|e| classify(&e, leg.spend.symbol))?;

        self.transition(ExecutionState::Submitting);
        let handle = self
            .wallet
            .send_transaction(request)
            .await
            .map_err(|e| classify(&e, leg.spend.symbol))?;

        self.transition(ExecutionState::AwaitingConfirmation);
        info!(tx_id = handle.id(), pool = %pool.fingerprint(), deadline, "Swap submitted");
        let result = handle
            .wait_for_result()
            .await
            .map_err(|e| classify(&e, leg.spend.symbol))?;
        if let TransactionStatus::Failure(reason) = &result.status {
            return Err(classify(
                &ProviderError::Reverted(reason.clone()),
                leg.spend.symbol,
            ));
        }

        Ok(Some(self.details(decision, &leg, &quote, &result, eth_usd)))
    }

    /// Preconditions in order; `None` for a hold
    fn validate(&self, decision: &TradeDecision) -> Result<Option<Leg>, TradeError> {
        if !self.wallet.is_connected() {
            return Err(TradeError::WalletNotConnected);
        }
        if decision.is_hold() {
            return Ok(None);
        }
        self.policy.check(decision.action())?;

        let symbol = &decision.token().symbol;
        let token = *self
            .tokens
            .get_by_symbol(symbol)
            .ok_or_else(|| TradeError::UnknownToken(symbol.clone()))?;
        if token.is_native {
            return Err(TradeError::InvalidPair(symbol.clone()));
        }

        let native = *self.tokens.native();
        let leg = match decision.action() {
            TradeAction::Sell => Leg {
                spend: token,
                receive: native,
            },
            _ => Leg {
                spend: native,
                receive: token,
            },
        };
        Ok(Some(leg))
    }

    /// Base units spent: ETH worth `amount` tokens for a buy, the tokens themselves for a sell
    ///
    /// Buys are priced from the feed rather than the decision's captured price,
    /// which describes whatever token the decision was analyzed against.
    async fn amount_in(
        &self,
        decision: &TradeDecision,
        leg: &Leg,
        eth_usd: f64,
    ) -> Result<u64, TradeError> {
        match decision.action() {
            TradeAction::Sell => to_base_units(decision.amount(), leg.spend.decimals),
            _ => {
                let token_usd = self.market.get_snapshot(leg.receive.symbol).await.price;
                let eth_amount = decision.amount() * token_usd / eth_usd;
                to_base_units(quantize(eth_amount, leg.spend.decimals), leg.spend.decimals)
            }
        }
    }

    async fn warn_if_fragmented(&self, spend: &TokenInfo) {
        let coins = match self.wallet.get_coins(&self.wallet.address()).await {
            Ok(coins) => coins,
            Err(e) => {
                debug!(error = %e, "Could not list spendable coins");
                return;
            }
        };
        let count = coins.iter().filter(|c| c.asset_id == spend.asset_id).count();
        if count > self.config.fragmentation_warning_coins {
            warn!(symbol = spend.symbol, coins = count, "Spendable funds are fragmented");
            self.notifier.warning(
                "UTXO Fragmentation Detected",
                format!(
                    "Your wallet has {} small transactions which may cause issues. \
                     Consider consolidating your funds by sending yourself a single transaction first.",
                    count
                ),
            );
        }
    }

    fn details(
        &self,
        decision: &TradeDecision,
        leg: &Leg,
        quote: &Quote,
        result: &TransactionResult,
        eth_usd: f64,
    ) -> TransactionDetails {
        let received = match result.received(&leg.receive.asset_id) {
            0 => quote.amount_out,
            units => units,
        };
        let spent = from_base_units(quote.amount_in, leg.spend.decimals);
        let got = from_base_units(received, leg.receive.decimals);
        let (token_amount, eth_amount) = match decision.action() {
            TradeAction::Sell => (spent, got),
            _ => (got, spent),
        };

        let effective_price = if token_amount > 0.0 {
            eth_amount / token_amount
        } else {
            0.0
        };
        let gas_cost = from_base_units(result.fee, self.tokens.native().decimals);
        let total_cost_eth = match decision.action() {
            TradeAction::Sell => gas_cost,
            _ => eth_amount + gas_cost,
        };

        TransactionDetails {
            hash: result.id.clone(),
            action: decision.action(),
            token_symbol: decision.token().symbol.clone(),
            token_amount,
            eth_amount,
            effective_price,
            price_in_usd: effective_price * eth_usd,
            gas_cost,
            gas_cost_usd: gas_cost * eth_usd,
            total_cost_eth,
            total_cost_usd: total_cost_eth * eth_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TokenSnapshot;
    use crate::config::{MarketDataConfig, Network};
    use crate::execution::{BlockHeader, Coin, SwapRequest, TransactionHandle};
    use crate::market::{MarketError, MarketSnapshot, PriceSource};
    use crate::notify::NotificationLevel;
    use crate::paper::{PaperChain, DEFAULT_TX_FEE, MAX_INPUTS};
    use crate::tokens::asset_ids;
    use alloy::primitives::B256;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const ETH: B256 = asset_ids::BASE_ASSET;
    const FUEL: B256 = asset_ids::FUEL_TESTNET;

    struct FixedPrices;

    #[async_trait]
    impl PriceSource for FixedPrices {
        async fn usd_price(&self, coingecko_id: &str) -> Result<f64, MarketError> {
            match coingecko_id {
                "ethereum" => Ok(2000.0),
                "fuel-network" => Ok(0.05),
                "usd-coin" => Ok(1.0),
                other => Err(MarketError::UnsupportedToken(other.to_string())),
            }
        }
    }

    fn tokens() -> TokenRegistry {
        TokenRegistry::new(Network::Testnet)
    }

    async fn paper_chain() -> PaperChain {
        let chain = PaperChain::new(ETH);
        chain.set_balance(ETH, 1_000_000_000).await;
        chain.set_balance(FUEL, 1_000_000_000_000).await;
        chain
            .add_pool(ETH, 100_000_000_000, FUEL, 4_000_000_000_000_000)
            .await;
        chain
    }

    fn executor_for(
        wallet: Arc<dyn WalletProvider>,
        chain: &PaperChain,
        config: TradingConfig,
    ) -> TradeExecutor {
        let market = Arc::new(MarketDataFeed::new(
            Arc::new(FixedPrices),
            Network::Testnet,
            MarketDataConfig::default(),
        ));
        TradeExecutor::new(wallet, Arc::new(chain.clone()), tokens(), market, config)
    }

    fn executor(chain: &PaperChain, config: TradingConfig) -> TradeExecutor {
        executor_for(Arc::new(chain.clone()), chain, config)
    }

    fn decision(action: TradeAction, symbol: &str, amount: f64) -> TradeDecision {
        let registry = tokens();
        let info = registry.get_by_symbol(symbol).copied().unwrap_or(*registry.native());
        let price = match symbol {
            "FUEL" => 0.05,
            "USDC" => 1.0,
            _ => 2000.0,
        };
        let market = MarketSnapshot::new(symbol, price, 6.0, 1.0e7);
        let mut token = TokenSnapshot::capture(&info, &market);
        token.symbol = symbol.to_string();
        TradeDecision::new(action, token, amount, "test", 0.8)
    }

    #[tokio::test]
    async fn test_buy_settles_with_buy_cost_invariant() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());
        let mut notes = exec.notifier().subscribe();

        let outcome = exec.execute(&decision(TradeAction::Buy, "FUEL", 100.0)).await;
        let details = outcome.details().expect("settled").clone();

        // 100 FUEL at $0.05 is $5, or 0.0025 ETH at $2000
        assert_eq!(details.eth_amount, 0.0025);
        assert!(details.token_amount > 99.0 && details.token_amount < 100.0);
        assert_eq!(details.gas_cost, from_base_units(DEFAULT_TX_FEE, 9));
        assert_eq!(details.total_cost_eth, details.eth_amount + details.gas_cost);
        assert_eq!(details.total_cost_usd, details.total_cost_eth * 2000.0);
        assert!((details.effective_price - 0.0025 / details.token_amount).abs() < 1e-15);
        assert_eq!(exec.state(), ExecutionState::Idle);

        let note = notes.recv().await.unwrap();
        assert_eq!(note.level, NotificationLevel::Success);
        assert_eq!(note.title, "Trade Executed");
        assert_eq!(note.message, "Successfully bought 100 FUEL");
        assert_eq!(chain.balance(&ETH).await, 1_000_000_000 - 2_500_000 - DEFAULT_TX_FEE);
    }

    #[tokio::test]
    async fn test_buy_priced_from_feed_not_captured_snapshot() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());

        // FUEL decision analyzed against an ETH snapshot carries ETH's price
        let registry = tokens();
        let fuel = *registry.get_by_symbol("FUEL").unwrap();
        let eth_market = MarketSnapshot::new("ETH", 2000.0, 6.0, 1.0e7);
        let token = TokenSnapshot::capture(&fuel, &eth_market);
        assert_eq!(token.price, 2000.0);
        let d = TradeDecision::new(TradeAction::Buy, token, 100.0, "test", 0.8);

        let outcome = exec.execute(&d).await;
        let details = outcome.details().expect("settled");
        assert_eq!(details.eth_amount, 0.0025);
        assert_eq!(chain.balance(&ETH).await, 1_000_000_000 - 2_500_000 - DEFAULT_TX_FEE);
    }

    #[tokio::test]
    async fn test_sell_settles_with_sell_cost_invariant() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());

        let outcome = exec.execute(&decision(TradeAction::Sell, "FUEL", 40.0)).await;
        let details = outcome.details().expect("settled");

        assert_eq!(details.token_amount, 40.0);
        assert!(details.eth_amount > 0.00099 && details.eth_amount < 0.001);
        assert_eq!(details.total_cost_eth, details.gas_cost);
        assert_eq!(chain.balance(&FUEL).await, 1_000_000_000_000 - 40_000_000_000);
        assert!(details.summary().starts_with("Transaction: 0x"));
        assert!(details.summary().contains("Sold: 40 FUEL"));
    }

    #[tokio::test]
    async fn test_disabled_sell_returns_to_idle() {
        let chain = paper_chain().await;
        let config = TradingConfig {
            disabled_actions: vec![TradeAction::Sell],
            ..TradingConfig::default()
        };
        let exec = executor(&chain, config);

        let outcome = exec.execute(&decision(TradeAction::Sell, "FUEL", 1.0)).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.kind(), Some(ErrorKind::ActionDisabled));
        assert_eq!(
            outcome.error().unwrap().to_string(),
            "Sell is temporarily disabled: disabled in trading configuration"
        );
        assert_eq!(exec.state(), ExecutionState::Idle);
        assert_eq!(chain.submitted().await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_gas_reports_shortfall() {
        let chain = paper_chain().await;
        chain.set_balance(ETH, 20_000).await;
        let exec = executor(&chain, TradingConfig::default());

        let outcome = exec.execute(&decision(TradeAction::Sell, "FUEL", 1.0)).await;
        assert_eq!(
            outcome.error(),
            Some(&TradeError::InsufficientGas {
                required: 50_000,
                available: 20_000,
                shortfall: 30_000,
            })
        );
        assert_eq!(chain.submitted().await, 0);
        assert_eq!(exec.state(), ExecutionState::Idle);
    }

    #[tokio::test]
    async fn test_hold_is_skipped_without_error() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());
        let outcome = exec.execute(&decision(TradeAction::Hold, "FUEL", 0.0)).await;
        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert_eq!(outcome.kind(), None);
        assert_eq!(chain.submitted().await, 0);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());

        chain.set_connected(false);
        let outcome = exec.execute(&decision(TradeAction::Hold, "FUEL", 0.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::WalletNotConnected));
        assert_eq!(outcome.error().unwrap().to_string(), "Please connect your wallet");
        chain.set_connected(true);

        let outcome = exec.execute(&decision(TradeAction::Buy, "DOGE", 1.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::UnknownToken));

        let outcome = exec.execute(&decision(TradeAction::Buy, "ETH", 0.01)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::InvalidPair));
    }

    #[tokio::test]
    async fn test_user_rejection_is_not_a_failure() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());
        let mut notes = exec.notifier().subscribe();
        chain.reject_next();

        let outcome = exec.execute(&decision(TradeAction::Buy, "FUEL", 10.0)).await;
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(outcome.kind(), None);
        assert_eq!(notes.recv().await.unwrap().title, "Transaction Rejected");
        assert_eq!(exec.state(), ExecutionState::Idle);
    }

    #[tokio::test]
    async fn test_fragmented_funds_are_classified() {
        let chain = paper_chain().await;
        chain.set_coin_count(FUEL, MAX_INPUTS + 1).await;
        let exec = executor(&chain, TradingConfig::default());
        let mut notes = exec.notifier().subscribe();

        let outcome = exec.execute(&decision(TradeAction::Sell, "FUEL", 1.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::FragmentedFunds));
        assert!(outcome.error().unwrap().to_string().contains("Your FUEL is split"));

        let warning = notes.recv().await.unwrap();
        assert_eq!(warning.title, "UTXO Fragmentation Detected");
        assert!(warning.message.starts_with("Your wallet has 256 small transactions"));
        let failure = notes.recv().await.unwrap();
        assert_eq!(failure.title, "Trade Failed");
    }

    #[tokio::test]
    async fn test_overspend_from_single_coin_is_a_balance_shortfall() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());

        // 1000 FUEL held in one coin
        let outcome = exec.execute(&decision(TradeAction::Sell, "FUEL", 5000.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::InsufficientBalance));
        let message = outcome.error().unwrap().to_string();
        assert!(message.starts_with("Insufficient FUEL balance"), "{}", message);
        assert!(!message.contains("UTXO"));
        assert_eq!(chain.submitted().await, 0);
        assert_eq!(exec.state(), ExecutionState::Idle);
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_without_retry() {
        let chain = paper_chain().await;
        let config = TradingConfig {
            deadline_blocks: 0,
            ..TradingConfig::default()
        };
        let exec = executor(&chain, config);

        let outcome = exec.execute(&decision(TradeAction::Buy, "FUEL", 10.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::UnknownError));
        assert_eq!(
            outcome.error().unwrap().to_string(),
            "Swap failed: DeadlineExpired"
        );
        assert_eq!(chain.submitted().await, 1);
    }

    #[tokio::test]
    async fn test_missing_pool_is_classified() {
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default());
        let outcome = exec.execute(&decision(TradeAction::Buy, "USDC", 1.0)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::PoolNotFound));
        assert_eq!(chain.submitted().await, 0);
    }

    #[tokio::test]
    async fn test_audit_log_records_each_execution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executions.jsonl");
        let chain = paper_chain().await;
        let exec = executor(&chain, TradingConfig::default())
            .with_audit_log(ExecutionAuditLog::new(&path));

        exec.execute(&decision(TradeAction::Buy, "FUEL", 10.0)).await;
        exec.execute(&decision(TradeAction::Hold, "FUEL", 0.0)).await;

        let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1]["status"], "success");
        assert_eq!(lines[1]["result"]["tokenSymbol"], "FUEL");
        assert_eq!(lines[3]["status"], "skipped");
    }

    /// Wallet whose submission blocks until the gate opens
    struct GatedWallet {
        chain: PaperChain,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl WalletProvider for GatedWallet {
        fn is_connected(&self) -> bool {
            self.chain.is_connected()
        }

        fn address(&self) -> String {
            self.chain.address()
        }

        async fn get_balance(&self, asset_id: Option<B256>) -> Result<u64, ProviderError> {
            self.chain.get_balance(asset_id).await
        }

        async fn get_coins(&self, owner: &str) -> Result<Vec<Coin>, ProviderError> {
            self.chain.get_coins(owner).await
        }

        async fn latest_block(&self) -> Result<BlockHeader, ProviderError> {
            self.chain.latest_block().await
        }

        async fn send_transaction(
            &self,
            request: SwapRequest,
        ) -> Result<Box<dyn TransactionHandle>, ProviderError> {
            self.gate.notified().await;
            self.chain.send_transaction(request).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_execute_is_rejected() {
        let chain = paper_chain().await;
        let gate = Arc::new(Notify::new());
        let wallet = Arc::new(GatedWallet {
            chain: chain.clone(),
            gate: gate.clone(),
        });
        let exec = Arc::new(executor_for(wallet, &chain, TradingConfig::default()));
        let buy = decision(TradeAction::Buy, "FUEL", 10.0);

        let first = tokio::spawn({
            let exec = exec.clone();
            let buy = buy.clone();
            async move { exec.execute(&buy).await }
        });

        let mut state = exec.subscribe_state();
        state
            .wait_for(|s| *s == ExecutionState::Submitting)
            .await
            .unwrap();

        let second = exec.execute(&buy).await;
        assert_eq!(second.kind(), Some(ErrorKind::ExecutionInProgress));
        assert_eq!(exec.state(), ExecutionState::Submitting);

        gate.notify_one();
        assert!(first.await.unwrap().is_success());
        assert_eq!(exec.state(), ExecutionState::Idle);
        assert_eq!(chain.submitted().await, 1);
    }
}
