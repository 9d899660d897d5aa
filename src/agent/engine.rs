//! Decision engine
//!
//! Orchestrates amount extraction, the personality's decision policy and trade
//! sizing. When a generative backend is configured it is asked for a reply
//! first; any backend failure falls back to a deterministic simulated reply.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::amount;
use super::backend::{BackendError, GenerationOptions, GenerativeBackend};
use super::history::{AgentMetrics, DecisionHistory, DEFAULT_CAPACITY};
use super::policy;
use super::suggestion::{self, Suggestion};
use super::{Personality, TokenSnapshot, TradeDecision};
use crate::market::{MarketSnapshot, WhaleTracker};
use crate::tokens::TokenRegistry;

/// Prompt used by [`DecisionEngine::analyze_market`] when no command is given
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze the current market and suggest a trade";

const TRADING_KEYWORDS: &[&str] = &[
    "trade",
    "buy",
    "sell",
    "market",
    "price",
    "analysis",
    "should i",
    "what do you think",
];

/// Whale transactions included in the whale-watcher's prompt
const WHALE_CONTEXT_SIZE: usize = 3;

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Generated,
    Simulated,
}

/// Reply to a chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub decision: Option<TradeDecision>,
    pub source: ReplySource,
}

/// Per-session agent state and decision logic
pub struct DecisionEngine {
    personality: Personality,
    tokens: TokenRegistry,
    backend: Option<Arc<dyn GenerativeBackend>>,
    options: GenerationOptions,
    history: DecisionHistory,
    whales: Option<WhaleTracker>,
    rng: StdRng,
}

impl DecisionEngine {
    pub fn new(personality: Personality, tokens: TokenRegistry) -> Self {
        Self {
            personality,
            tokens,
            backend: None,
            options: GenerationOptions {
                temperature: 0.8,
                max_tokens: 300,
            },
            history: DecisionHistory::new(DEFAULT_CAPACITY),
            whales: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = DecisionHistory::new(capacity);
        self
    }

    /// Attach the whale-activity feed used for whale-watcher prompts
    pub fn with_whale_tracker(mut self, tracker: WhaleTracker) -> Self {
        self.whales = Some(tracker);
        self
    }

    /// Seed the RNG behind randomized policies
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn risk_tolerance(&self) -> f64 {
        self.personality.risk_tolerance()
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn history(&self) -> &DecisionHistory {
        &self.history
    }

    pub fn metrics(&self) -> AgentMetrics {
        self.history.metrics()
    }

    /// Append a decision to the session history
    pub fn record(&mut self, decision: TradeDecision) {
        self.history.push(decision);
    }

    /// Reply to `message`, optionally proposing a trade
    pub async fn chat(&mut self, message: &str, snapshot: Option<&MarketSnapshot>) -> ChatReply {
        let explicit = amount::extract(message);
        if let Some(a) = explicit {
            debug!(amount = a, "User requested explicit amount");
        }

        match self.generated_reply(message, snapshot, explicit).await {
            Ok(reply) => reply,
            Err(BackendError::Unconfigured) => {
                debug!("No generative backend, using simulated reply");
                self.simulated_reply(message, snapshot, explicit)
            }
            Err(e) => {
                warn!(personality = %self.personality, error = %e, "Chat generation failed, using simulated reply");
                self.simulated_reply(message, snapshot, explicit)
            }
        }
    }

    /// Run a market analysis and record the resulting decision
    pub async fn analyze_market(
        &mut self,
        snapshot: &MarketSnapshot,
        command: Option<&str>,
    ) -> TradeDecision {
        let reply = self
            .chat(command.unwrap_or(DEFAULT_ANALYSIS_PROMPT), Some(snapshot))
            .await;

        let decision = reply.decision.unwrap_or_else(|| {
            let token = self.tokens.resolve_or_fallback(Some(&snapshot.symbol));
            TradeDecision::unable_to_analyze(TokenSnapshot::capture(token, snapshot))
        });

        info!(
            personality = %self.personality,
            action = %decision.action(),
            symbol = %decision.token().symbol,
            amount = decision.amount(),
            confidence = decision.confidence(),
            "Market analyzed"
        );
        self.record(decision.clone());
        decision
    }

    async fn generated_reply(
        &mut self,
        message: &str,
        snapshot: Option<&MarketSnapshot>,
        explicit: Option<f64>,
    ) -> Result<ChatReply, BackendError> {
        let backend = self.backend.clone().ok_or(BackendError::Unconfigured)?;

        let system_prompt = self.system_prompt();
        let context = self.market_context(snapshot, explicit).await;
        let user_prompt = format!("{}\n\nMarket Context:\n{}", message, context);

        let text = backend
            .generate(&system_prompt, &user_prompt, self.options)
            .await?;

        let split = suggestion::split(&text);
        let decision = match (split.suggestion, snapshot) {
            (Some(s), Some(snapshot)) => Some(self.decision_from_suggestion(s, snapshot, explicit)),
            (Some(_), None) => {
                debug!("Ignoring trade suggestion without market data");
                None
            }
            (None, _) => None,
        };

        Ok(ChatReply {
            response: split.visible,
            decision,
            source: ReplySource::Generated,
        })
    }

    fn decision_from_suggestion(
        &self,
        s: Suggestion,
        snapshot: &MarketSnapshot,
        explicit: Option<f64>,
    ) -> TradeDecision {
        let named = s
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&snapshot.symbol);
        let token = self.tokens.resolve_or_fallback(Some(named));
        if token.symbol != snapshot.symbol {
            debug!(token = token.symbol, snapshot = %snapshot.symbol, "Suggestion resolved to a token other than the snapshot's");
        }
        let confidence = s.confidence.unwrap_or(0.5);
        let suggested = s.amount.filter(|a| a.is_finite() && *a > 0.0);

        let amount = explicit.or(suggested).unwrap_or_else(|| {
            amount::calculate(s.action, confidence, self.risk_tolerance())
        });

        TradeDecision::new(
            s.action,
            TokenSnapshot::capture(token, snapshot),
            amount,
            s.reasoning
                .unwrap_or_else(|| "Based on current market conditions".to_string()),
            confidence,
        )
    }

    /// Deterministic reply built from the decision policy and flavor text
    pub fn simulated_reply(
        &mut self,
        message: &str,
        snapshot: Option<&MarketSnapshot>,
        explicit: Option<f64>,
    ) -> ChatReply {
        let lower = message.to_lowercase();
        let is_trading = TRADING_KEYWORDS.iter().any(|k| lower.contains(k));

        let (response, decision) = if lower.contains("who are you") {
            (self.personality.introduction().to_string(), None)
        } else if let (true, Some(snapshot)) = (is_trading, snapshot) {
            let decision = self.simulated_decision(snapshot, explicit);
            if decision.is_hold() {
                (decision.reason().to_string(), None)
            } else {
                let response = format!(
                    "{}\n\nI suggest we {} {} {} with {:.0}% confidence!",
                    decision.reason(),
                    decision.action(),
                    decision.amount(),
                    decision.token().symbol,
                    decision.confidence() * 100.0
                );
                (response, Some(decision))
            }
        } else {
            (self.personality.small_talk().to_string(), None)
        };

        ChatReply {
            response,
            decision,
            source: ReplySource::Simulated,
        }
    }

    fn simulated_decision(&mut self, snapshot: &MarketSnapshot, explicit: Option<f64>) -> TradeDecision {
        let verdict = policy::decide(self.personality, snapshot, &mut self.rng);
        let token = self.tokens.resolve_or_fallback(Some(&snapshot.symbol));
        let amount = explicit.unwrap_or_else(|| {
            amount::calculate(verdict.action, verdict.confidence, self.risk_tolerance())
        });

        TradeDecision::new(
            verdict.action,
            TokenSnapshot::capture(token, snapshot),
            amount,
            verdict.reason,
            verdict.confidence,
        )
    }

    fn system_prompt(&self) -> String {
        let p = self.personality;
        format!(
            "You are a {p} crypto trading AI assistant. {traits}\n\n\
             You can:\n\
             1. Have conversations about crypto, trading, and general topics\n\
             2. Analyze market conditions when asked\n\
             3. Suggest trades when appropriate\n\n\
             When the user asks about trading or market analysis, analyze the provided market data and consider suggesting a trade.\n\
             If the user specifies an amount (like \"buy 0.5 ETH\" or \"sell 1.2 tokens\"), use that exact amount in your trade suggestion.\n\
             If suggesting a trade, include a special tag in your response: {marker} followed by a JSON object with the trade details.\n\n\
             Format for trade suggestions:\n\
             {marker}{{\"action\":\"buy/sell/hold\",\"confidence\":0.0-1.0,\"reasoning\":\"your analysis\",\"token\":\"TOKEN_SYMBOL\",\"amount\":0.0}}\n\n\
             IMPORTANT: If the user specified an amount, you MUST include it in the amount field. Amounts must have maximum 9 decimal places.\n\n\
             Remember to stay in character as a {p} trader!",
            traits = p.traits(),
            marker = suggestion::MARKER,
        )
    }

    async fn market_context(&self, snapshot: Option<&MarketSnapshot>, explicit: Option<f64>) -> String {
        let Some(s) = snapshot else {
            return "No market data available.".to_string();
        };

        let rsi = s
            .rsi
            .map(|r| format!("{:.2}", r))
            .unwrap_or_else(|| "N/A".to_string());
        let market_cap = s
            .market_cap
            .map(|m| format!("${:.2}B", m / 1e9))
            .unwrap_or_else(|| "N/A".to_string());

        let mut context = format!(
            "Current {sym} market data:\n\
             - Price: ${price:.2}\n\
             - 24h Change: {change:.2}%\n\
             - Volume: ${volume:.2}M\n\
             - RSI: {rsi}\n\
             - Market Cap: {market_cap}\n",
            sym = s.symbol,
            price = s.price,
            change = s.change_24h,
            volume = s.volume / 1e6,
        );

        if let Some(a) = explicit {
            let _ = writeln!(context, "\nUser requested amount: {} {}", a, s.symbol);
        }

        if self.personality == Personality::WhaleWatcher {
            if let Some(tracker) = &self.whales {
                let recent = tracker.recent().await;
                if !recent.is_empty() {
                    context.push_str("\nRecent whale activity:\n");
                    for tx in recent.iter().take(WHALE_CONTEXT_SIZE) {
                        let _ = writeln!(context, "- ${:.0} {} transaction", tx.usd_value, tx.token);
                    }
                }
            }
        }

        context
    }
}
