//! USD price sources

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use super::MarketError;

/// Spot price lookup keyed by CoinGecko id
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn usd_price(&self, coingecko_id: &str) -> Result<f64, MarketError>;
}

/// CoinGecko simple-price over a QuickNode JSON-RPC endpoint
pub struct QuickNodePriceSource {
    client: Client,
    url: Url,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<HashMap<String, CoinPrice>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CoinPrice {
    usd: Option<f64>,
}

impl QuickNodePriceSource {
    pub fn new(url: &str) -> Result<Self, MarketError> {
        let url = Url::parse(url).map_err(|e| MarketError::InvalidEndpoint(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MarketError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PriceSource for QuickNodePriceSource {
    async fn usd_price(&self, coingecko_id: &str) -> Result<f64, MarketError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "cg_simplePrice",
            "params": [coingecko_id],
            "id": 1
        });

        let response = self.client.post(self.url.clone()).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(MarketError::BadResponse(format!(
                "HTTP {} from price endpoint",
                response.status()
            )));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(MarketError::BadResponse(err.to_string()));
        }

        body.result
            .and_then(|mut r| r.remove(coingecko_id))
            .and_then(|p| p.usd)
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| {
                MarketError::BadResponse(format!("price data not available for {}", coingecko_id))
            })
    }
}

/// Source used when no price endpoint is configured; every lookup fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePriceSource;

#[async_trait]
impl PriceSource for UnavailablePriceSource {
    async fn usd_price(&self, _coingecko_id: &str) -> Result<f64, MarketError> {
        Err(MarketError::SourceUnavailable(
            "QuickNode CoinGecko URL not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rpc_result() {
        let body: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "ethereum": { "usd": 3120.5 } }
        }))
        .unwrap();
        let price = body.result.unwrap().remove("ethereum").unwrap().usd;
        assert_eq!(price, Some(3120.5));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            QuickNodePriceSource::new("not a url"),
            Err(MarketError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            QuickNodePriceSource::new("ftp://example.com/cg"),
            Err(MarketError::InvalidEndpoint(_))
        ));
        assert!(QuickNodePriceSource::new("https://example.quiknode.pro/abc/").is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_source_fails() {
        let err = UnavailablePriceSource.usd_price("ethereum").await.unwrap_err();
        assert!(matches!(err, MarketError::SourceUnavailable(_)));
    }
}
