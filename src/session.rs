//! Trading session
//!
//! Wires one [`DecisionEngine`] to a [`TradeExecutor`]: chat produces an optional
//! proposal, the user confirms or declines it, and confirmed proposals are
//! executed and recorded in the agent's history.

use std::sync::Arc;
use tracing::info;

use crate::agent::{AgentMetrics, ChatReply, DecisionEngine, Personality, TradeDecision};
use crate::execution::{Outcome, TradeExecutor};
use crate::market::{MarketDataFeed, MarketSnapshot};
use crate::Result;

/// One user's session with a selected personality
pub struct TradingSession {
    engine: DecisionEngine,
    executor: Arc<TradeExecutor>,
    market: Arc<MarketDataFeed>,
    symbol: String,
    pending: Option<TradeDecision>,
    /// Whether the pending proposal is already in the engine's history
    pending_recorded: bool,
}

impl TradingSession {
    pub fn new(
        engine: DecisionEngine,
        executor: Arc<TradeExecutor>,
        market: Arc<MarketDataFeed>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            executor,
            market,
            symbol: symbol.into(),
            pending: None,
            pending_recorded: false,
        }
    }

    pub fn personality(&self) -> Personality {
        self.engine.personality()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Switch the token under discussion; a pending proposal is dropped
    pub fn set_symbol(&mut self, symbol: &str) -> Result<()> {
        let token = self.engine.tokens().get_by_symbol(symbol).ok_or_else(|| {
            crate::Error::InvalidArgument(format!("unknown token '{}'", symbol))
        })?;
        self.symbol = token.symbol.to_string();
        self.pending = None;
        self.pending_recorded = false;
        Ok(())
    }

    pub fn pending(&self) -> Option<&TradeDecision> {
        self.pending.as_ref()
    }

    pub fn metrics(&self) -> AgentMetrics {
        self.engine.metrics()
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn executor(&self) -> &TradeExecutor {
        &self.executor
    }

    pub async fn snapshot(&self) -> MarketSnapshot {
        self.market.get_snapshot(&self.symbol).await
    }

    /// Chat about the current token; a non-hold proposal becomes pending
    pub async fn chat(&mut self, message: &str) -> ChatReply {
        let snapshot = self.snapshot().await;
        let reply = self.engine.chat(message, Some(&snapshot)).await;
        self.pending = reply.decision.clone().filter(|d| !d.is_hold());
        self.pending_recorded = false;
        reply
    }

    /// Analyze the current token; the decision is recorded by the engine
    pub async fn analyze(&mut self, command: Option<&str>) -> TradeDecision {
        let snapshot = self.snapshot().await;
        let decision = self.engine.analyze_market(&snapshot, command).await;
        self.pending = Some(decision.clone()).filter(|d| !d.is_hold());
        self.pending_recorded = true;
        decision
    }

    /// Execute the pending proposal; `None` when nothing is pending
    ///
    /// Each proposal enters the history once: chat proposals here, analyses
    /// when they were made.
    pub async fn confirm(&mut self) -> Option<Outcome> {
        let decision = self.pending.take()?;
        info!(
            action = %decision.action(),
            symbol = %decision.token().symbol,
            amount = decision.amount(),
            "User approved trade"
        );
        let outcome = self.executor.execute(&decision).await;
        if !std::mem::take(&mut self.pending_recorded) {
            self.engine.record(decision);
        }
        Some(outcome)
    }

    /// Discard the pending proposal
    pub fn decline(&mut self) -> Option<TradeDecision> {
        let declined = self.pending.take();
        self.pending_recorded = false;
        if declined.is_some() {
            info!("User declined trade");
        }
        declined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TradeAction;
    use crate::config::{MarketDataConfig, Network, TradingConfig};
    use crate::market::{MarketError, PriceSource};
    use crate::paper::PaperChain;
    use crate::tokens::TokenRegistry;
    use async_trait::async_trait;

    struct FixedPrices;

    #[async_trait]
    impl PriceSource for FixedPrices {
        async fn usd_price(&self, coingecko_id: &str) -> std::result::Result<f64, MarketError> {
            match coingecko_id {
                "ethereum" => Ok(2000.0),
                "fuel-network" => Ok(0.05),
                _ => Ok(1.0),
            }
        }
    }

    async fn session(personality: Personality) -> (TradingSession, PaperChain) {
        let tokens = TokenRegistry::new(Network::Testnet);
        let chain = PaperChain::demo(&tokens).await;
        let market = Arc::new(MarketDataFeed::new(
            Arc::new(FixedPrices),
            Network::Testnet,
            MarketDataConfig::default(),
        ));
        let executor = Arc::new(TradeExecutor::new(
            Arc::new(chain.clone()),
            Arc::new(chain.clone()),
            tokens.clone(),
            market.clone(),
            TradingConfig::default(),
        ));
        let engine = DecisionEngine::new(personality, tokens).with_seed(7);
        (TradingSession::new(engine, executor, market, "FUEL"), chain)
    }

    #[tokio::test]
    async fn test_identity_question_has_no_proposal() {
        let (mut session, _) = session(Personality::Fomo).await;
        let reply = session.chat("who are you?").await;
        assert!(reply.decision.is_none());
        assert!(session.pending().is_none());
        assert!(session.confirm().await.is_none());
    }

    #[tokio::test]
    async fn test_confirm_executes_and_records() {
        // a single price point means zero change, so diamond hands holds
        let (mut session, chain) = session(Personality::DiamondHands).await;
        let decision = session.analyze(None).await;
        assert_eq!(decision.action(), TradeAction::Hold);
        assert!(session.pending().is_none());
        assert_eq!(session.engine().history().len(), 1);

        let snapshot = MarketSnapshot::new("FUEL", 0.05, -12.0, 1.0e7);
        let reply = session
            .engine
            .chat("should i buy 50 FUEL?", Some(&snapshot))
            .await;
        session.pending = reply.decision.filter(|d| !d.is_hold());
        session.pending_recorded = false;
        let pending = session.pending().expect("proposal").clone();
        assert_eq!(pending.action(), TradeAction::Buy);
        assert_eq!(pending.amount(), 50.0);

        let outcome = session.confirm().await.expect("executed");
        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(session.engine().history().len(), 2);
        assert_eq!(session.metrics().total_trades, 1);
        assert_eq!(chain.submitted().await, 1);
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_analyzed_proposal_recorded_once() {
        let (mut session, chain) = session(Personality::Degen).await;

        // degen buys on volume above 10M, which the fixed feed does not reach;
        // its coin flip does, so analyze until a buy comes up
        let mut decision = session.analyze(Some("should i buy 10")).await;
        for _ in 0..32 {
            if !decision.is_hold() {
                break;
            }
            decision = session.analyze(Some("should i buy 10")).await;
        }
        assert_eq!(decision.action(), TradeAction::Buy);
        assert_eq!(decision.amount(), 10.0);

        let before = session.engine().history().len();
        let trades_before = session.metrics().total_trades;
        let outcome = session.confirm().await.expect("executed");
        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(session.engine().history().len(), before);
        assert_eq!(session.metrics().total_trades, trades_before);
        assert_eq!(chain.submitted().await, 1);
    }

    #[tokio::test]
    async fn test_decline_and_symbol_switch() {
        let (mut session, _) = session(Personality::Fomo).await;
        assert!(session.set_symbol("DOGE").is_err());
        session.set_symbol("USDC").unwrap();
        assert_eq!(session.symbol(), "USDC");
        assert!(session.decline().is_none());
    }
}
