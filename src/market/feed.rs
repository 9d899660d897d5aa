//! Cached market data feed with polling subscriptions
//!
//! Snapshots are cached per symbol for a freshness window. An expired entry
//! forces a fetch; a failed fetch degrades to the last cached snapshot, and to
//! synthetic fallback data when nothing was ever cached.

use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::snapshot::{MarketSnapshot, PricePoint};
use super::source::PriceSource;
use super::subscriptions::{Subscription, SubscriptionRegistry, TopicHandle};
use super::MarketError;
use crate::config::{MarketDataConfig, Network};
use crate::tokens::TokenRegistry;

struct CacheEntry {
    snapshot: MarketSnapshot,
    fetched_at: Instant,
}

struct FeedState {
    tokens: TokenRegistry,
    cache: HashMap<String, CacheEntry>,
    history: HashMap<String, Vec<PricePoint>>,
}

/// Market data collaborator
pub struct MarketDataFeed {
    source: Arc<dyn PriceSource>,
    config: MarketDataConfig,
    state: Mutex<FeedState>,
    rng: std::sync::Mutex<StdRng>,
    subscriptions: Arc<SubscriptionRegistry>,
}

impl MarketDataFeed {
    pub fn new(source: Arc<dyn PriceSource>, network: Network, config: MarketDataConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(FeedState {
                tokens: TokenRegistry::new(network),
                cache: HashMap::new(),
                history: HashMap::new(),
            }),
            rng: std::sync::Mutex::new(StdRng::from_entropy()),
            subscriptions: Arc::new(SubscriptionRegistry::new()),
        }
    }

    /// Seed the RNG behind synthetic fallback data
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: std::sync::Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.config.cache_ttl_ms)
    }

    /// Switch networks, dropping cached snapshots and price history
    pub async fn set_network(&self, network: Network) {
        let mut state = self.state.lock().await;
        state.tokens = TokenRegistry::new(network);
        state.cache.clear();
        state.history.clear();
        debug!(network = network.name(), "Market data reset for network change");
    }

    /// Recorded price history of `symbol`, oldest first
    pub async fn price_history(&self, symbol: &str) -> Vec<PricePoint> {
        let state = self.state.lock().await;
        state.history.get(symbol).cloned().unwrap_or_default()
    }

    /// Current snapshot of `symbol`; never fails
    pub async fn get_snapshot(&self, symbol: &str) -> MarketSnapshot {
        let cached = {
            let state = self.state.lock().await;
            state.cache.get(symbol).map(|e| (e.snapshot.clone(), e.fetched_at))
        };

        if let Some((snapshot, fetched_at)) = &cached {
            if fetched_at.elapsed() < self.cache_ttl() {
                return snapshot.clone();
            }
        }

        match self.fetch(symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(symbol, error = %e, "Failed to fetch market data");
                match cached {
                    Some((snapshot, _)) => snapshot,
                    None => self.fallback(symbol),
                }
            }
        }
    }

    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot, MarketError> {
        let coingecko_id = {
            let state = self.state.lock().await;
            state
                .tokens
                .get_by_symbol(symbol)
                .map(|t| t.coingecko_id)
                .ok_or_else(|| MarketError::UnsupportedToken(symbol.to_string()))?
        };

        let price = self.source.usd_price(coingecko_id).await?;
        let now = Utc::now();

        let mut state = self.state.lock().await;
        let history = state.history.entry(symbol.to_string()).or_default();
        history.push(PricePoint::at(price, now));
        if history.len() > self.config.max_history_points {
            let excess = history.len() - self.config.max_history_points;
            history.drain(..excess);
        }

        let snapshot = MarketSnapshot::from_history(symbol, history, now);
        state.cache.insert(
            symbol.to_string(),
            CacheEntry {
                snapshot: snapshot.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(snapshot)
    }

    /// Synthetic snapshot used when no data was ever fetched for `symbol`
    fn fallback(&self, symbol: &str) -> MarketSnapshot {
        let base_price = match symbol {
            "ETH" => 2000.0,
            "FUEL" => 0.05,
            "USDC" => 1.0,
            _ => 100.0,
        };
        let volatility = if symbol == "USDC" { 0.001 } else { 0.02 };

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();

        let price_history = (0..=10)
            .rev()
            .map(|i| {
                let when = now - ChronoDuration::seconds(i * 5);
                let price = base_price * (1.0 + (rng.gen::<f64>() - 0.5) * volatility);
                PricePoint::at(price, when)
            })
            .collect();

        MarketSnapshot {
            symbol: symbol.to_string(),
            timestamp: now,
            price: base_price * (1.0 + (rng.gen::<f64>() - 0.5) * volatility * 2.0),
            change_24h: (rng.gen::<f64>() - 0.5) * 10.0,
            volume: 5_000_000.0 + rng.gen::<f64>() * 10_000_000.0,
            high_24h: Some(base_price * 1.05),
            low_24h: Some(base_price * 0.95),
            rsi: Some(30.0 + rng.gen::<f64>() * 40.0),
            market_cap: None,
            price_history,
        }
    }

    /// Receive a snapshot of `symbol` immediately and then every poll interval
    ///
    /// Subscribers of the same symbol share one polling task, which stops when
    /// the last [`Subscription`] is dropped. A fetch already in flight at that
    /// point completes but its result is not delivered.
    pub fn subscribe<F>(self: &Arc<Self>, symbol: &str, callback: F) -> Subscription
    where
        F: Fn(&MarketSnapshot) + Send + Sync + 'static,
    {
        let (subscription, opened) = self.subscriptions.add(symbol, Arc::new(callback));
        if let Some(topic) = opened {
            tokio::spawn(Arc::clone(self).poll(topic));
        }
        subscription
    }

    async fn poll(self: Arc<Self>, topic: TopicHandle) {
        let TopicHandle {
            symbol,
            generation,
            mut stop,
        } = topic;
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            let snapshot = self.get_snapshot(&symbol).await;
            if !self.subscriptions.notify(&symbol, generation, &snapshot) {
                break;
            }
        }
        debug!(symbol = %symbol, "Market data polling stopped");
    }

    /// Number of live subscribers of `symbol`
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.subscriptions.subscriber_count(symbol)
    }
}
