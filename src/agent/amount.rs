//! Trade amount extraction and sizing
//!
//! Amounts are human-readable token units with at most [`MAX_FRACTION_DIGITS`]
//! fractional digits, the precision of the chain's native asset.

use regex::Regex;
use std::sync::OnceLock;

use super::TradeAction;

/// Base trade size in native-asset units before confidence/risk scaling
pub const BASE_AMOUNT: f64 = 0.01;

/// Upper bound of a calculated trade size
pub const MAX_AMOUNT: f64 = 0.1;

/// Smallest representable unit of the native asset (10^-9)
pub const MAX_FRACTION_DIGITS: u8 = 9;

/// Trade-verb patterns are tried before the bare-number pattern, which only
/// matches a number leading the message
fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\bbuy\s+(\d+\.?\d*)",
            r"(?i)\bsell\s+(\d+\.?\d*)",
            r"(?i)\btrade\s+(\d+\.?\d*)",
            r"(?i)\bswap\s+(\d+\.?\d*)",
            r"(?i)^\s*(\d+\.?\d*)\s*(?:eth|fuel|usdc|tokens?)?\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("amount pattern is valid"))
        .collect()
    })
}

/// Cut a decimal literal to at most `digits` fractional digits without rounding
fn truncate_literal(literal: &str, digits: usize) -> &str {
    match literal.find('.') {
        Some(dot) if literal.len() - dot - 1 > digits => &literal[..dot + 1 + digits],
        _ => literal,
    }
}

/// Extract an explicit trade amount from free text
///
/// Returns `None` when no positive finite number is present.
pub fn extract(text: &str) -> Option<f64> {
    for pattern in patterns() {
        let Some(literal) = pattern.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        let literal = literal.as_str();
        let truncated = truncate_literal(literal, MAX_FRACTION_DIGITS as usize);
        if truncated.len() != literal.len() {
            tracing::warn!(
                amount = literal,
                "Amount has more than {} decimal places, truncating",
                MAX_FRACTION_DIGITS
            );
        }

        match truncated.trim_end_matches('.').parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount > 0.0 => return Some(amount),
            _ => continue,
        }
    }
    None
}

/// Round `value` to at most min(`decimals`, 9) fractional digits
///
/// Non-finite and negative inputs quantize to 0.
pub fn quantize(value: f64, decimals: u8) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let digits = decimals.min(MAX_FRACTION_DIGITS) as usize;
    format!("{:.*}", digits, value).parse().unwrap_or(0.0)
}

/// Derive a trade size from confidence and risk tolerance
pub fn calculate(action: TradeAction, confidence: f64, risk_tolerance: f64) -> f64 {
    if action == TradeAction::Hold {
        return 0.0;
    }
    let confidence = unit_clamp(confidence);
    let risk_tolerance = unit_clamp(risk_tolerance);
    let amount = (BASE_AMOUNT * confidence * risk_tolerance).min(MAX_AMOUNT);
    quantize(amount, MAX_FRACTION_DIGITS)
}

/// Clamp into [0, 1], mapping NaN to 0
pub(crate) fn unit_clamp(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
