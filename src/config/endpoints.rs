//! Endpoint and credential resolution
//!
//! Resolved from environment variables, highest priority first:
//! 1. Explicit per-service URLs (`QUICKNODE_FUEL_URL`, `QUICKNODE_CG_URL`, `OPENAI_BASE_URL`)
//! 2. Generic fallbacks (`FUEL_RPC_URL`)
//! 3. Public endpoints of the selected network (rate limited, for testing only)
//!
//! # Examples
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export QUICKNODE_CG_URL="https://example.quiknode.pro/KEY"
//! export QUICKNODE_FUEL_URL="https://example.fuel-mainnet.quiknode.pro/KEY/v1/graphql"
//! ```

use secrecy::SecretString;

use super::Network;

/// Environment variable names
mod env_vars {
    pub const OPENAI_API_KEY: &str = super::super::OPENAI_API_KEY_ENV;
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const QUICKNODE_CG_URL: &str = "QUICKNODE_CG_URL";
    pub const QUICKNODE_FUEL_URL: &str = "QUICKNODE_FUEL_URL";
    pub const FUEL_RPC_URL: &str = "FUEL_RPC_URL";
}

/// Default OpenAI-compatible API base
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Resolved endpoints for the external collaborators
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Generative backend key; `None` means the simulated responder is used
    pub openai_api_key: Option<SecretString>,
    /// Chat completions API base
    pub openai_base_url: String,
    /// QuickNode endpoint with the CoinGecko price add-on
    pub price_url: Option<String>,
    /// Fuel GraphQL endpoint
    pub fuel_url: String,
}

impl Endpoints {
    /// Resolve endpoints for `network` from the environment
    pub fn from_env(network: Network) -> Self {
        Self::resolve(network, |name| std::env::var(name).ok())
    }

    /// Resolve endpoints using an arbitrary variable lookup
    pub fn resolve<F>(network: Network, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let openai_api_key = non_empty(env_vars::OPENAI_API_KEY).map(SecretString::from);
        if openai_api_key.is_none() {
            tracing::info!("No OpenAI API key configured, agents will use simulated responses");
        }

        let openai_base_url = non_empty(env_vars::OPENAI_BASE_URL)
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        let price_url = non_empty(env_vars::QUICKNODE_CG_URL);
        if price_url.is_none() {
            tracing::warn!("QUICKNODE_CG_URL not set, market data will use fallback prices");
        }

        let fuel_url = if let Some(url) = non_empty(env_vars::QUICKNODE_FUEL_URL) {
            tracing::debug!("Using QUICKNODE_FUEL_URL for {}", network.name());
            url
        } else if let Some(url) = non_empty(env_vars::FUEL_RPC_URL) {
            tracing::debug!("Using FUEL_RPC_URL for {}", network.name());
            url
        } else {
            tracing::warn!(
                "No RPC configured for {}, using public endpoint (rate limited)",
                network.name()
            );
            network.graphql_url().to_string()
        };

        Self {
            openai_api_key,
            openai_base_url,
            price_url,
            fuel_url,
        }
    }

    /// Whether a generative backend can be constructed
    pub fn has_generative_backend(&self) -> bool {
        self.openai_api_key.is_some()
    }
}
