//! Reference-counted per-symbol subscription registry
//!
//! The first subscriber of a symbol opens a topic and receives a stop signal for
//! the topic's polling task; the last unsubscribe removes the topic, which drops
//! the signal's sender and ends the task. Each topic carries a generation number
//! so a task outliving its topic never delivers to a newer topic's subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use super::MarketSnapshot;

/// Subscriber callback
pub type Callback = Arc<dyn Fn(&MarketSnapshot) + Send + Sync>;

/// Handed to the polling task of a newly opened topic
#[derive(Debug)]
pub struct TopicHandle {
    pub symbol: String,
    pub generation: u64,
    /// Resolves (with an error) once the topic is closed
    pub stop: watch::Receiver<()>,
}

struct Topic {
    generation: u64,
    subscribers: Vec<(u64, Callback)>,
    _stop: watch::Sender<()>,
}

/// Registry of live subscriptions
#[derive(Default)]
pub struct SubscriptionRegistry {
    topics: Mutex<HashMap<String, Topic>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        // callbacks cannot leave the map half-updated, so a poisoned lock is still usable
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `callback` for `symbol`
    ///
    /// Returns a [`TopicHandle`] when this is the symbol's first subscriber.
    pub fn add(
        self: &Arc<Self>,
        symbol: &str,
        callback: Callback,
    ) -> (Subscription, Option<TopicHandle>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut topics = self.topics();

        let opened = if let Some(topic) = topics.get_mut(symbol) {
            topic.subscribers.push((id, callback));
            None
        } else {
            let generation = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = watch::channel(());
            topics.insert(
                symbol.to_string(),
                Topic {
                    generation,
                    subscribers: vec![(id, callback)],
                    _stop: tx,
                },
            );
            tracing::debug!(symbol, "Opened market data topic");
            Some(TopicHandle {
                symbol: symbol.to_string(),
                generation,
                stop: rx,
            })
        };

        let subscription = Subscription {
            registry: Arc::clone(self),
            symbol: symbol.to_string(),
            id,
            active: true,
        };
        (subscription, opened)
    }

    fn remove(&self, symbol: &str, id: u64) {
        let mut topics = self.topics();
        let Some(topic) = topics.get_mut(symbol) else {
            return;
        };
        topic.subscribers.retain(|(sid, _)| *sid != id);
        if topic.subscribers.is_empty() {
            topics.remove(symbol);
            tracing::debug!(symbol, "Closed market data topic");
        }
    }

    /// Deliver `snapshot` to the current subscribers of the topic generation
    ///
    /// Callbacks run with the registry locked and must not subscribe or
    /// unsubscribe. Returns `false` once the topic generation is gone.
    pub fn notify(&self, symbol: &str, generation: u64, snapshot: &MarketSnapshot) -> bool {
        let topics = self.topics();
        match topics.get(symbol) {
            Some(topic) if topic.generation == generation => {
                for (_, callback) in &topic.subscribers {
                    callback(snapshot);
                }
                true
            }
            _ => false,
        }
    }

    /// Number of live subscribers of `symbol`
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.topics()
            .get(symbol)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }

    /// Whether `symbol` has an open topic
    pub fn is_active(&self, symbol: &str) -> bool {
        self.topics().contains_key(symbol)
    }
}

/// Live subscription; unsubscribes when dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Arc<SubscriptionRegistry>,
    symbol: String,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::replace(&mut self.active, false) {
            self.registry.remove(&self.symbol, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("symbol", &self.symbol)
            .field("id", &self.id)
            .finish()
    }
}
