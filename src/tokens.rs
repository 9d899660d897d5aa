//! Shared token registry
//!
//! Centralizes token metadata (asset ids, decimals, price-feed ids) per network.
//! This module is the single source of truth for token information.

use alloy::primitives::{b256, B256};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::Network;

/// Token metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    /// Token symbol (e.g., "ETH", "USDC")
    pub symbol: &'static str,
    /// Display name
    pub name: &'static str,
    /// Asset id on the Fuel network
    pub asset_id: B256,
    /// Number of decimals
    pub decimals: u8,
    /// CoinGecko id used by the price source
    pub coingecko_id: &'static str,
    /// Whether this is the network's native fee asset
    pub is_native: bool,
}

impl TokenInfo {
    const fn new(
        symbol: &'static str,
        name: &'static str,
        asset_id: B256,
        decimals: u8,
        coingecko_id: &'static str,
    ) -> Self {
        Self {
            symbol,
            name,
            asset_id,
            decimals,
            coingecko_id,
            is_native: false,
        }
    }

    const fn native(self) -> Self {
        Self {
            is_native: true,
            ..self
        }
    }
}

/// Well-known asset ids per network
pub mod asset_ids {
    use super::*;

    /// Base asset (ETH) on every Fuel network
    pub const BASE_ASSET: B256 =
        b256!("f8f8b6283d7fa5b672b530cbb84fcccb4ff8dc40f8176ef4544ddb1f1952ad07");

    // === Testnet ===
    pub const FUEL_TESTNET: B256 =
        b256!("324d0c35a4299ef88138a656d5272c5a3a9ccde2630ae055dacaf9d13443d53b");
    pub const USDC_TESTNET: B256 =
        b256!("c26c91055de37528492e7e97d91c6f4abe34aae26f2c4d25cff6bfe45b5dc9a9");

    // === Mainnet ===
    pub const FUEL_MAINNET: B256 =
        b256!("1d5d97005e41cae2187a895fd8eab0506111e0e2f3331cd3912c15c24e3c1d82");
    pub const USDC_MAINNET: B256 =
        b256!("286c479da40dc953bddc3bb4c453b608bba2e0ac483b077bd475174115395e6b");
}

/// Symbol used when a decision references no resolvable token
pub const FALLBACK_SYMBOL: &str = "ETH";

/// Token registry for one network
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    network: Network,
    tokens: Vec<TokenInfo>,
    by_symbol: HashMap<&'static str, usize>,
    by_asset: HashMap<B256, usize>,
}

impl TokenRegistry {
    /// Create the registry of known tokens for `network`
    pub fn new(network: Network) -> Self {
        use asset_ids::*;

        let (fuel, usdc) = match network {
            Network::Testnet => (FUEL_TESTNET, USDC_TESTNET),
            Network::Mainnet => (FUEL_MAINNET, USDC_MAINNET),
        };

        let tokens = vec![
            TokenInfo::new("ETH", "Ethereum", BASE_ASSET, 9, "ethereum").native(),
            TokenInfo::new("FUEL", "Fuel", fuel, 9, "fuel-network"),
            TokenInfo::new("USDC", "USD Coin", usdc, 6, "usd-coin"),
        ];

        let by_symbol = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.symbol, i))
            .collect();
        let by_asset = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.asset_id, i))
            .collect();

        Self {
            network,
            tokens,
            by_symbol,
            by_asset,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Get token info by exact symbol
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.by_symbol.get(symbol).map(|&i| &self.tokens[i])
    }

    /// Get token info by asset id
    pub fn get_by_asset_id(&self, asset_id: &B256) -> Option<&TokenInfo> {
        self.by_asset.get(asset_id).map(|&i| &self.tokens[i])
    }

    /// The network's native fee asset
    pub fn native(&self) -> &TokenInfo {
        self.tokens
            .iter()
            .find(|t| t.is_native)
            .unwrap_or(&self.tokens[0])
    }

    /// Resolve a symbol, defaulting to the canonical fallback asset
    pub fn resolve_or_fallback(&self, symbol: Option<&str>) -> &TokenInfo {
        symbol
            .and_then(|s| self.get_by_symbol(s))
            .or_else(|| self.get_by_symbol(FALLBACK_SYMBOL))
            .unwrap_or_else(|| self.native())
    }

    /// All tokens tradable on this network
    pub fn all(&self) -> &[TokenInfo] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_asset() {
        let registry = TokenRegistry::new(Network::Testnet);
        let eth = registry.native();
        assert_eq!(eth.symbol, "ETH");
        assert_eq!(eth.decimals, 9);
        assert_eq!(eth.asset_id, asset_ids::BASE_ASSET);
        assert!(eth.is_native);
    }

    #[test]
    fn test_network_specific_ids() {
        let testnet = TokenRegistry::new(Network::Testnet);
        let mainnet = TokenRegistry::new(Network::Mainnet);

        let usdc_test = testnet.get_by_symbol("USDC").unwrap();
        let usdc_main = mainnet.get_by_symbol("USDC").unwrap();
        assert_eq!(usdc_test.decimals, 6);
        assert_ne!(usdc_test.asset_id, usdc_main.asset_id);
        assert_eq!(
            mainnet.get_by_asset_id(&asset_ids::FUEL_MAINNET).unwrap().symbol,
            "FUEL"
        );
        assert!(testnet.get_by_asset_id(&asset_ids::FUEL_MAINNET).is_none());
    }

    #[test]
    fn test_symbol_lookup_is_exact() {
        let registry = TokenRegistry::new(Network::Testnet);
        assert!(registry.get_by_symbol("usdc").is_none());
        assert!(registry.get_by_symbol("DOGE").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_eth() {
        let registry = TokenRegistry::new(Network::Testnet);
        assert_eq!(registry.resolve_or_fallback(Some("DOGE")).symbol, "ETH");
        assert_eq!(registry.resolve_or_fallback(None).symbol, "ETH");
        assert_eq!(registry.resolve_or_fallback(Some("FUEL")).symbol, "FUEL");
    }
}
