//! Bounded decision history and derived agent metrics

use serde::Serialize;

use super::{TradeAction, TradeDecision};

/// Default number of decisions retained per session
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity circular buffer of decisions
///
/// Appending past capacity overwrites the oldest entry; entries are never
/// rewritten in place otherwise.
#[derive(Debug, Clone)]
pub struct DecisionHistory {
    slots: Vec<TradeDecision>,
    /// Index of the slot the next push writes once the buffer is full
    cursor: usize,
    capacity: usize,
}

impl DecisionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn push(&mut self, decision: TradeDecision) {
        if self.slots.len() < self.capacity {
            self.slots.push(decision);
        } else {
            self.slots[self.cursor] = decision;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TradeDecision> {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    pub fn latest(&self) -> Option<&TradeDecision> {
        if self.slots.len() < self.capacity {
            self.slots.last()
        } else {
            let idx = (self.cursor + self.capacity - 1) % self.capacity;
            self.slots.get(idx)
        }
    }

    /// Compute metrics over the retained entries
    ///
    /// `win_rate` counts a buy as a win when the token was already up at decision
    /// time, and a sell when it was already down. It says whether the agent traded
    /// with the prevailing move, not whether the trade was profitable.
    pub fn metrics(&self) -> AgentMetrics {
        let trades: Vec<&TradeDecision> = self.iter().filter(|d| !d.is_hold()).collect();
        if trades.is_empty() {
            return AgentMetrics::default();
        }

        let wins = trades
            .iter()
            .filter(|d| match d.action() {
                TradeAction::Buy => d.token().change_24h > 0.0,
                TradeAction::Sell => d.token().change_24h < 0.0,
                TradeAction::Hold => false,
            })
            .count();
        let confidence_sum: f64 = trades.iter().map(|d| d.confidence()).sum();
        let total = trades.len();

        AgentMetrics {
            total_trades: total,
            win_rate: wins as f64 / total as f64,
            avg_confidence: confidence_sum / total as f64,
            profit_loss: 0.0,
        }
    }
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Performance summary of an agent session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    /// Non-hold decisions in history
    pub total_trades: usize,
    /// Fraction of trades aligned with the decision-time 24h change
    pub win_rate: f64,
    /// Mean confidence of non-hold decisions
    pub avg_confidence: f64,
    /// Realized P&L is not tracked; always 0
    pub profit_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::decision::tests::token;

    fn decision(action: TradeAction, change: f64, confidence: f64) -> TradeDecision {
        TradeDecision::new(action, token("ETH", change), 0.01, "test", confidence)
    }

    #[test]
    fn test_evicts_oldest_on_overflow() {
        let mut history = DecisionHistory::new(3);
        for i in 0..5 {
            history.push(decision(TradeAction::Buy, i as f64, 0.5));
        }
        assert_eq!(history.len(), 3);
        let changes: Vec<f64> = history.iter().map(|d| d.token().change_24h).collect();
        assert_eq!(changes, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest().unwrap().token().change_24h, 4.0);
    }

    #[test]
    fn test_default_capacity() {
        let mut history = DecisionHistory::default();
        for _ in 0..150 {
            history.push(decision(TradeAction::Hold, 0.0, 0.5));
        }
        assert_eq!(history.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_metrics_empty() {
        let history = DecisionHistory::new(10);
        assert_eq!(history.metrics(), AgentMetrics::default());
    }

    #[test]
    fn test_metrics_use_decision_time_change() {
        let mut history = DecisionHistory::new(10);
        history.push(decision(TradeAction::Buy, 4.0, 0.8)); // win
        history.push(decision(TradeAction::Buy, -1.0, 0.6)); // loss
        history.push(decision(TradeAction::Sell, -2.0, 1.0)); // win
        history.push(decision(TradeAction::Hold, 9.0, 0.0)); // ignored

        let m = history.metrics();
        assert_eq!(m.total_trades, 3);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.avg_confidence - 0.8).abs() < 1e-12);
        assert_eq!(m.profit_loss, 0.0);
    }
}
