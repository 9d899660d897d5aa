//! Personality-driven decision engine
//!
//! Turns market snapshots and free-text user messages into validated
//! [`TradeDecision`]s:
//! - [`amount`]: explicit amount extraction, trade sizing and quantization
//! - [`policy`]: one pure decision policy per [`Personality`]
//! - [`engine`]: chat orchestration with generative backend and simulated fallback
//! - [`history`]: bounded decision history and derived metrics

pub mod amount;
pub mod backend;
pub mod decision;
pub mod engine;
pub mod history;
pub mod personality;
pub mod policy;
pub mod suggestion;

pub use backend::{BackendError, GenerationOptions, GenerativeBackend, OpenAiBackend};
pub use decision::{TokenSnapshot, TradeAction, TradeDecision};
pub use engine::{ChatReply, DecisionEngine, ReplySource, DEFAULT_ANALYSIS_PROMPT};
pub use history::{AgentMetrics, DecisionHistory};
pub use personality::Personality;
pub use policy::{decide, PolicyVerdict};
