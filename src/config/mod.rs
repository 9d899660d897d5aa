//! Configuration for the persona trading agent

pub mod endpoints;

use serde::{Deserialize, Serialize};

use crate::agent::TradeAction;

// Re-export endpoint resolution
pub use endpoints::Endpoints;

/// OpenAI API key environment variable name
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Supported Fuel networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Testnet => 0,
            Network::Mainnet => 9889,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Testnet => "Fuel Sepolia Testnet",
            Network::Mainnet => "Fuel Mainnet",
        }
    }

    /// Public GraphQL endpoint of the network
    pub fn graphql_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://testnet.fuel.network/v1/graphql",
            Network::Mainnet => "https://mainnet.fuel.network/v1/graphql",
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }
}

/// Default policy behavior when no rule matches an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDefaultMode {
    #[default]
    AllowAll,
    DefaultDeny,
}

/// Policy settings for trade actions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicySettings {
    /// Default mode when policy.json is missing or has no matching rule
    #[serde(default)]
    pub default_mode: PolicyDefaultMode,
    /// Require policy.json to be present (fail closed if missing)
    #[serde(default)]
    pub require_file: bool,
}

/// Generative agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chat completion model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token ceiling
    pub max_tokens: u32,
    /// Capacity of the per-session decision history
    pub history_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.8,
            max_tokens: 300,
            history_capacity: 100,
        }
    }
}

/// Swap execution settings
///
/// These are fixed constants rather than values derived from network conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Slippage tolerance in basis points (100 = 1%)
    pub slippage_bps: u16,
    /// Gas ceiling attached to every swap request
    pub gas_limit: u64,
    /// Deadline offset from the latest block height
    pub deadline_blocks: u32,
    /// Minimum fee-asset balance (base units) required before quoting
    pub min_gas_reserve: u64,
    /// Spendable coin count above which a fragmentation warning is raised
    pub fragmentation_warning_coins: usize,
    /// Actions temporarily disabled regardless of policy file
    pub disabled_actions: Vec<TradeAction>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 100,
            gas_limit: 100_000,
            deadline_blocks: 100,
            min_gas_reserve: 50_000,
            fragmentation_warning_coins: 5,
            disabled_actions: Vec::new(),
        }
    }
}

/// Market data polling and caching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    /// Freshness window of cached snapshots
    pub cache_ttl_ms: u64,
    /// Poll interval of subscribed symbols
    pub poll_interval_ms: u64,
    /// Price points retained per symbol
    pub max_history_points: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 5_000,
            poll_interval_ms: 5_000,
            max_history_points: 50,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network the session trades on
    #[serde(default)]
    pub network: Network,
    /// Generative agent settings
    #[serde(default)]
    pub agent: AgentConfig,
    /// Execution settings
    #[serde(default)]
    pub trading: TradingConfig,
    /// Market data settings
    #[serde(default)]
    pub market: MarketDataConfig,
    /// Policy settings
    #[serde(default)]
    pub policy: PolicySettings,
    /// Path to execution audit log file
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            agent: AgentConfig::default(),
            trading: TradingConfig::default(),
            market: MarketDataConfig::default(),
            policy: PolicySettings::default(),
            audit_log_path: Some("executions.jsonl".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::Error::Config(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
