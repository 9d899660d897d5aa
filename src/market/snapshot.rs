//! Market snapshots and the indicators derived from price history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of price deltas averaged by [`rsi`]
pub const RSI_PERIOD: usize = 14;

/// One recorded price observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Wall-clock label, `HH:MM:SS`
    pub time: String,
    pub price: f64,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl PricePoint {
    pub fn at(price: f64, when: DateTime<Utc>) -> Self {
        Self {
            time: when.format("%H:%M:%S").to_string(),
            price,
            timestamp: when.timestamp_millis(),
        }
    }
}

/// Immutable view of one asset at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// USD price
    pub price: f64,
    /// Signed percentage change
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    /// USD notional volume
    pub volume: f64,
    #[serde(rename = "high24h")]
    pub high_24h: Option<f64>,
    #[serde(rename = "low24h")]
    pub low_24h: Option<f64>,
    /// Relative strength index, 0-100
    pub rsi: Option<f64>,
    pub market_cap: Option<f64>,
    /// Most recent last
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

impl MarketSnapshot {
    /// Snapshot with only the fields the decision policies read
    pub fn new(symbol: impl Into<String>, price: f64, change_24h: f64, volume: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp: Utc::now(),
            price,
            change_24h,
            volume,
            high_24h: None,
            low_24h: None,
            rsi: None,
            market_cap: None,
            price_history: Vec::new(),
        }
    }

    /// Derive a snapshot from the recorded history of `symbol`
    ///
    /// `history` must be non-empty and end with the current price.
    pub(crate) fn from_history(symbol: &str, history: &[PricePoint], now: DateTime<Utc>) -> Self {
        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let price = prices.last().copied().unwrap_or_default();
        let high = prices.iter().copied().fold(f64::MIN, f64::max);
        let low = prices.iter().copied().fold(f64::MAX, f64::min);

        Self {
            symbol: symbol.to_string(),
            timestamp: now,
            price,
            change_24h: change_since_first(&prices),
            volume: estimated_volume(&prices),
            high_24h: Some(high),
            low_24h: Some(low),
            rsi: Some(rsi(&prices)),
            market_cap: Some(price * 1_000_000_000.0),
            price_history: history.to_vec(),
        }
    }
}

/// Percentage change from the oldest to the newest price; 0 with fewer than 2 points
pub fn change_since_first(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(&first), Some(&last)) if prices.len() >= 2 && first != 0.0 => {
            (last - first) / first * 100.0
        }
        _ => 0.0,
    }
}

/// Volume estimate that grows with the observed price range
pub fn estimated_volume(prices: &[f64]) -> f64 {
    let volatility = if prices.len() > 1 {
        let max = prices.iter().copied().fold(f64::MIN, f64::max);
        let min = prices.iter().copied().fold(f64::MAX, f64::min);
        if min > 0.0 {
            (max - min).abs() / min
        } else {
            0.0
        }
    } else {
        0.0
    };
    5_000_000.0 + volatility * 100_000_000.0
}

/// Relative strength index over the last [`RSI_PERIOD`] deltas
///
/// Neutral 50 until enough history exists; 100 when there were no losses.
pub fn rsi(prices: &[f64]) -> f64 {
    if prices.len() < RSI_PERIOD {
        return 50.0;
    }

    let start = (prices.len() - RSI_PERIOD).max(1);
    let (gains, losses) = (start..prices.len()).fold((0.0, 0.0), |(g, l), i| {
        let delta = prices[i] - prices[i - 1];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });

    let avg_gain = gains / RSI_PERIOD as f64;
    let avg_loss = losses / RSI_PERIOD as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
