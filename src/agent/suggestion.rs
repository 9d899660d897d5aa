//! Structured trade suggestions embedded in generated text
//!
//! The generative backend is asked to append `[TRADE_SUGGESTION]` immediately
//! followed by a single-line JSON object:
//!
//! ```text
//! [TRADE_SUGGESTION]{"action":"buy","confidence":0.8,"reasoning":"...","token":"ETH","amount":0.5}
//! ```
//!
//! Only `action` is required.

use serde::Deserialize;

use super::TradeAction;

/// Literal marker preceding the JSON fragment
pub const MARKER: &str = "[TRADE_SUGGESTION]";

/// A parsed suggestion fragment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub action: TradeAction,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Generated text split into its visible part and the embedded suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReply {
    /// Text with every suggestion fragment removed
    pub visible: String,
    /// First well-formed suggestion, if any
    pub suggestion: Option<Suggestion>,
    /// A marker was present but its fragment could not be parsed
    pub malformed: bool,
}

/// Locate, parse and strip suggestion fragments
pub fn split(text: &str) -> SplitReply {
    let mut visible = String::with_capacity(text.len());
    let mut suggestion = None;
    let mut malformed = false;
    let mut rest = text;

    while let Some(start) = rest.find(MARKER) {
        visible.push_str(&rest[..start]);
        let after = &rest[start + MARKER.len()..];
        let (parsed, consumed) = parse_fragment(after);

        match parsed {
            Ok(s) => {
                if suggestion.is_none() {
                    suggestion = Some(s);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse trade suggestion");
                malformed = true;
            }
        }
        rest = &after[consumed..];
    }
    visible.push_str(rest);

    SplitReply {
        visible: visible.trim().to_string(),
        suggestion,
        malformed,
    }
}

/// Parse the fragment at the head of `s`, returning the bytes it spans
fn parse_fragment(s: &str) -> (Result<Suggestion, serde_json::Error>, usize) {
    let mut stream = serde_json::Deserializer::from_str(s).into_iter::<serde_json::Value>();
    match stream.next() {
        Some(Ok(value)) => {
            let consumed = stream.byte_offset();
            (serde_json::from_value(value), consumed)
        }
        Some(Err(e)) => (Err(e), fragment_extent(s)),
        None => (
            Err(serde::de::Error::custom("missing suggestion object")),
            0,
        ),
    }
}

/// Extent of an unparseable fragment: through the first `}` on its line
fn fragment_extent(s: &str) -> usize {
    let line_end = s.find('\n').unwrap_or(s.len());
    match s[..line_end].find('}') {
        Some(close) => close + 1,
        None => line_end,
    }
}
