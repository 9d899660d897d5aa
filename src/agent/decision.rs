//! Trade decision value objects

use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::amount::{quantize, unit_clamp};
use crate::market::MarketSnapshot;
use crate::tokens::TokenInfo;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::Hold => "hold",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            "hold" => Ok(TradeAction::Hold),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown trade action '{}'",
                other
            ))),
        }
    }
}

/// Token metadata and market state captured at decision time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub symbol: String,
    pub asset_id: B256,
    pub decimals: u8,
    pub name: String,
    pub price: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    pub market_cap: Option<f64>,
}

impl TokenSnapshot {
    pub fn capture(token: &TokenInfo, market: &MarketSnapshot) -> Self {
        Self {
            symbol: token.symbol.to_string(),
            asset_id: token.asset_id,
            decimals: token.decimals,
            name: token.name.to_string(),
            price: market.price,
            change_24h: market.change_24h,
            volume_24h: market.volume,
            market_cap: market.market_cap,
        }
    }
}

/// A validated trade proposal
///
/// Built only through [`TradeDecision::new`], which enforces: confidence in [0, 1],
/// amount non-negative and quantized to the token's precision, and `hold` whenever
/// the amount cannot be traded. A changed amount or action needs a new decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeDecision {
    action: TradeAction,
    token: TokenSnapshot,
    amount: f64,
    reason: String,
    confidence: f64,
    created_at: DateTime<Utc>,
}

impl TradeDecision {
    pub fn new(
        action: TradeAction,
        token: TokenSnapshot,
        amount: f64,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let confidence = unit_clamp(confidence);
        let mut action = action;
        let mut amount = quantize(amount, token.decimals);

        if action == TradeAction::Hold {
            amount = 0.0;
        } else if amount == 0.0 {
            tracing::debug!(symbol = %token.symbol, "Non-tradable amount, forcing hold");
            action = TradeAction::Hold;
        }

        Self {
            action,
            token,
            amount,
            reason: reason.into(),
            confidence,
            created_at: Utc::now(),
        }
    }

    /// Default decision when no analysis could be produced
    pub fn unable_to_analyze(token: TokenSnapshot) -> Self {
        Self::new(
            TradeAction::Hold,
            token,
            0.0,
            "Unable to analyze market conditions",
            0.0,
        )
    }

    pub fn action(&self) -> TradeAction {
        self.action
    }

    pub fn token(&self) -> &TokenSnapshot {
        &self.token
    }

    /// Amount in human-readable token units
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_hold(&self) -> bool {
        self.action == TradeAction::Hold
    }
}
