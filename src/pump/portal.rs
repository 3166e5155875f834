//! Unsigned create-transaction retrieval
//!
//! The service answers either with raw transaction bytes
//! (`application/octet-stream`) or with JSON carrying a base64 transaction
//! or a bare base64 message.

use super::errors::PumpError;
use crate::config::PumpConfig;
use crate::metrics::{metrics, Timer};
use crate::tx_submit::Draft;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use solana_sdk::{message::VersionedMessage, transaction::VersionedTransaction};
use std::time::Duration;
use tracing::{debug, error};

/// On-chain metadata reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadataRef {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// `create` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    pub action: String,
    pub public_key: String,
    pub token_metadata: TokenMetadataRef,
    pub mint: String,
    /// Sent as the string "true"
    pub denominated_in_sol: String,
    pub amount: f64,
    pub slippage: u32,
    pub priority_fee: f64,
    pub pool: String,
}

impl CreatePayload {
    pub fn create(
        config: &PumpConfig,
        public_key: String,
        mint: String,
        token_metadata: TokenMetadataRef,
        amount: f64,
    ) -> Self {
        Self {
            action: "create".to_string(),
            public_key,
            token_metadata,
            mint,
            denominated_in_sol: "true".to_string(),
            amount,
            slippage: config.slippage,
            priority_fee: config.priority_fee,
            pool: config.pool.clone(),
        }
    }
}

pub struct PumpPortalClient {
    http: Client,
    url: String,
}

impl PumpPortalClient {
    pub fn new(config: &PumpConfig) -> Result<Self, PumpError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, config.portal_url.clone()))
    }

    pub fn with_client(http: Client, url: String) -> Self {
        Self { http, url }
    }

    /// Request a fresh unsigned transaction
    ///
    /// Each call yields a transaction against the service's current
    /// blockhash.
    pub async fn create_transaction(&self, payload: &CreatePayload) -> Result<Draft, PumpError> {
        debug!(url = %self.url, mint = %payload.mint, "Requesting unsigned create transaction");
        let timer = Timer::new();
        let response = self.http.post(&self.url).json(payload).send().await;
        timer.observe_duration(&metrics().http_latency);
        let response = response?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "PumpPortal API error");
            return Err(PumpError::Portal {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;
        decode_create_response(&content_type, &body)
    }
}

/// Decode a create-tx response body according to its content type
pub fn decode_create_response(content_type: &str, body: &[u8]) -> Result<Draft, PumpError> {
    if content_type.contains("application/octet-stream") {
        let transaction: VersionedTransaction = bincode::deserialize(body)
            .map_err(|e| PumpError::Decode(format!("invalid transaction bytes: {}", e)))?;
        return Ok(Draft::new(transaction));
    }

    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| PumpError::UnexpectedResponseShape)?;

    if let Some(encoded) = json.get("transaction").and_then(|v| v.as_str()) {
        let raw = decode_base64(encoded)?;
        let transaction: VersionedTransaction = bincode::deserialize(&raw)
            .map_err(|e| PumpError::Decode(format!("invalid transaction: {}", e)))?;
        Ok(Draft::new(transaction))
    } else if let Some(encoded) = json.get("message").and_then(|v| v.as_str()) {
        let raw = decode_base64(encoded)?;
        let message: VersionedMessage = bincode::deserialize(&raw)
            .map_err(|e| PumpError::Decode(format!("invalid message: {}", e)))?;
        Ok(Draft::from_message(message))
    } else {
        Err(PumpError::UnexpectedResponseShape)
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, PumpError> {
    BASE64
        .decode(encoded)
        .map_err(|e| PumpError::Decode(format!("invalid base64: {}", e)))
}
