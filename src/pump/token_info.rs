//! Token lookup by mint address

use super::errors::PumpError;
use crate::config::PumpConfig;
use crate::metrics::{metrics, Timer};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tracing::{debug, error};

/// Token as reported by the lookup service
///
/// Fields the service adds beyond these are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub mint: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub image_uri: Option<String>,
    pub metadata_uri: Option<String>,
    pub creator: Option<String>,
    pub market_cap: Option<f64>,
    pub usd_market_cap: Option<f64>,

    /// Bonding curve finished and liquidity migrated
    pub complete: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct TokenInfoClient {
    http: Client,
    base_url: String,
}

impl TokenInfoClient {
    pub fn new(config: &PumpConfig) -> Result<Self, PumpError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, config.token_info_url.clone()))
    }

    pub fn with_client(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a launched token's details
    pub async fn token_info(&self, mint: &str) -> Result<TokenInfo, PumpError> {
        let mint: Pubkey = mint
            .trim()
            .parse()
            .map_err(|_| PumpError::InvalidRequest("Invalid mint address".to_string()))?;
        let url = format!("{}/{}", self.base_url, mint);
        debug!(%url, "Fetching token info");

        let timer = Timer::new();
        let response = self.http.get(&url).send().await;
        timer.observe_duration(&metrics().http_latency);
        let response = response?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %mint, "Token info lookup failed");
            return Err(PumpError::TokenInfo {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
