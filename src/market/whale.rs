//! Whale-activity side feed
//!
//! Keeps the most recent large transactions for narrative context in the
//! whale-watcher's prompts. Never drives numeric decisions.

use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// USD value at or above which a transfer counts as whale activity
pub const WHALE_THRESHOLD_USD: f64 = 10_000.0;

/// Transactions retained by the tracker
pub const RECENT_CAPACITY: usize = 10;

/// Labelled addresses used by the simulated generator
const KNOWN_WHALES: [(&str, &str); 3] = [
    ("0x742d35Cc6634C0532925a3b844Bc9e7595f7b1e0", "Whale Alpha"),
    ("0x53d284357ec70cE289D6D64134DfAc8E511c8a3D", "Smart Money"),
    ("0xBE0eB53F46cd790Cd13851d5EFf43D12404d33E8", "Institution"),
];

/// A large transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleTransaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub usd_value: f64,
    pub token: String,
    pub timestamp: DateTime<Utc>,
}

impl WhaleTransaction {
    pub fn new(from: &str, to: &str, usd_value: f64, token: &str) -> Self {
        Self {
            hash: B256::ZERO.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            usd_value,
            token: token.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Random whale transfer worth 10k-60k USD
    fn simulated<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (whale, _label) = KNOWN_WHALES[rng.gen_range(0..KNOWN_WHALES.len())];
        let counterparty = format!("0x{}", hex_string(rng, 20));
        let usd_value = ((rng.gen::<f64>() * 50_000.0 + 10_000.0) * 100.0).round() / 100.0;
        let (from, to) = if rng.gen_bool(0.5) {
            (whale.to_string(), counterparty)
        } else {
            (counterparty, whale.to_string())
        };

        Self {
            hash: format!("0x{}", hex_string(rng, 32)),
            from,
            to,
            usd_value,
            token: "ETH".to_string(),
            timestamp: Utc::now(),
        }
    }
}

fn hex_string<R: Rng + ?Sized>(rng: &mut R, bytes: usize) -> String {
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Whether `usd_value` qualifies as whale activity
pub fn is_whale_transaction(usd_value: f64) -> bool {
    usd_value >= WHALE_THRESHOLD_USD
}

struct TrackerInner {
    recent: RwLock<VecDeque<WhaleTransaction>>,
    events: broadcast::Sender<WhaleTransaction>,
}

/// Shared handle to the whale-activity feed
#[derive(Clone)]
pub struct WhaleTracker {
    inner: Arc<TrackerInner>,
}

impl WhaleTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(TrackerInner {
                recent: RwLock::new(VecDeque::with_capacity(RECENT_CAPACITY)),
                events,
            }),
        }
    }

    /// Record a transaction; below-threshold transfers are ignored
    pub async fn record(&self, tx: WhaleTransaction) {
        if !is_whale_transaction(tx.usd_value) {
            return;
        }
        {
            let mut recent = self.inner.recent.write().await;
            recent.push_front(tx.clone());
            recent.truncate(RECENT_CAPACITY);
        }
        tracing::debug!(usd_value = tx.usd_value, token = %tx.token, "Whale transaction recorded");
        // no receivers is fine
        let _ = self.inner.events.send(tx);
    }

    /// Recent whale transactions, newest first
    pub async fn recent(&self) -> Vec<WhaleTransaction> {
        self.inner.recent.read().await.iter().cloned().collect()
    }

    /// Stream of newly recorded transactions; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<WhaleTransaction> {
        self.inner.events.subscribe()
    }

    /// Generate simulated whale activity: every `interval`, a 30% chance of one transfer
    pub fn spawn_simulation(&self, interval: Duration, seed: Option<u64>) -> JoinHandle<()> {
        let tracker = self.clone();
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // skip the immediate first tick
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if rng.gen::<f64>() > 0.7 {
                    let tx = WhaleTransaction::simulated(&mut rng);
                    tracker.record(tx).await;
                }
            }
        })
    }
}

impl Default for WhaleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        assert!(is_whale_transaction(10_000.0));
        assert!(!is_whale_transaction(9_999.99));
    }

    #[tokio::test]
    async fn test_recent_is_bounded_newest_first() {
        let tracker = WhaleTracker::new();
        for i in 0..15 {
            tracker
                .record(WhaleTransaction::new("a", "b", 10_000.0 + i as f64, "ETH"))
                .await;
        }
        let recent = tracker.recent().await;
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0].usd_value, 10_014.0);
        assert_eq!(recent[9].usd_value, 10_005.0);
    }

    #[tokio::test]
    async fn test_small_transfers_ignored() {
        let tracker = WhaleTracker::new();
        tracker.record(WhaleTransaction::new("a", "b", 500.0, "ETH")).await;
        assert!(tracker.recent().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_receives_records() {
        let tracker = WhaleTracker::new();
        let mut rx = tracker.subscribe();
        tracker.record(WhaleTransaction::new("a", "b", 42_000.0, "ETH")).await;
        assert_eq!(rx.recv().await.unwrap().usd_value, 42_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_produces_whales() {
        let tracker = WhaleTracker::new();
        let handle = tracker.spawn_simulation(Duration::from_secs(10), Some(11));
        tokio::time::sleep(Duration::from_secs(600)).await;
        handle.abort();

        let recent = tracker.recent().await;
        assert!(!recent.is_empty());
        for tx in recent {
            assert!((10_000.0..=60_000.0).contains(&tx.usd_value));
            assert!(KNOWN_WHALES.iter().any(|(a, _)| *a == tx.from || *a == tx.to));
            assert_eq!(tx.hash.len(), 66);
        }
    }
}
