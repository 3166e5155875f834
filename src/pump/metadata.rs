//! Metadata pinning through the token creation service's IPFS endpoint

use super::errors::PumpError;
use crate::config::PumpConfig;
use crate::metrics::{metrics, Timer};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const IMAGE_FILE_NAME: &str = "token-image.png";

/// Text fields sent alongside the image
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFields {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub twitter: String,
    pub telegram: String,
    pub website: String,
}

/// Pinning service response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedMetadata {
    pub metadata_uri: String,

    /// Echoed metadata document (name, symbol, image, ...)
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl PinnedMetadata {
    /// Pinned image URI, when the service echoes it
    pub fn image_uri(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("image")?.as_str()
    }
}

pub struct MetadataPinner {
    http: Client,
    url: String,
}

impl MetadataPinner {
    pub fn new(config: &PumpConfig) -> Result<Self, PumpError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, config.ipfs_url.clone()))
    }

    pub fn with_client(http: Client, url: String) -> Self {
        Self { http, url }
    }

    /// Upload image and fields; returns the metadata URI to embed on chain
    pub async fn pin(
        &self,
        fields: &MetadataFields,
        image: Vec<u8>,
    ) -> Result<PinnedMetadata, PumpError> {
        let file = Part::bytes(image)
            .file_name(IMAGE_FILE_NAME)
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", file)
            .text("name", fields.name.clone())
            .text("symbol", fields.symbol.clone())
            .text("description", fields.description.clone())
            .text("twitter", fields.twitter.clone())
            .text("telegram", fields.telegram.clone())
            .text("website", fields.website.clone())
            .text("showName", "true");

        debug!(url = %self.url, symbol = %fields.symbol, "Uploading metadata to IPFS");
        let timer = Timer::new();
        let response = self.http.post(&self.url).multipart(form).send().await;
        timer.observe_duration(&metrics().http_latency);
        let response = response?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "IPFS upload failed");
            return Err(PumpError::Pinning {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinnedMetadata = response.json().await?;
        info!(metadata_uri = %pinned.metadata_uri, "IPFS upload successful");
        Ok(pinned)
    }
}
