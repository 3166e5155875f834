//! PostgREST client for recording and listing launches

use crate::config::BackendConfig;
use crate::metrics::{metrics, Timer};

use chrono::{DateTime, Utc};
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Columns selected for listings
pub const LAUNCH_COLUMNS: &str =
    "name,symbol,description,image_url,mint,pump_url,dev_wallet,created_at";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Missing env: SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY")]
    MissingConfig,

    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One launched token as stored in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub mint: String,
    #[serde(default)]
    pub pump_url: Option<String>,
    #[serde(default)]
    pub dev_wallet: Option<String>,
    /// Assigned by the database on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

pub struct LaunchRegistry {
    http: Client,
    base_url: String,
    service_key: String,
    launches_table: String,
    projects_table: String,
    recent_limit: usize,
    explore_limit: usize,
}

impl LaunchRegistry {
    /// Both the URL and the service-role key must be set
    pub fn new(config: &BackendConfig) -> Result<Self, RegistryError> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let (base_url, service_key) =
            match (non_blank(&config.url), non_blank(&config.service_role_key)) {
                (Some(url), Some(key)) => (url.trim_end_matches('/').to_string(), key),
                _ => return Err(RegistryError::MissingConfig),
            };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            service_key,
            launches_table: config.launches_table.clone(),
            projects_table: config.projects_table.clone(),
            recent_limit: config.recent_limit,
            explore_limit: config.explore_limit,
        })
    }

    /// Newest launches, for the landing view
    pub async fn recent_launches(&self) -> Result<Vec<LaunchRecord>, RegistryError> {
        self.list(&self.launches_table, self.recent_limit).await
    }

    /// Newest projects, for the explore view
    pub async fn explore(&self) -> Result<Vec<LaunchRecord>, RegistryError> {
        self.list(&self.projects_table, self.explore_limit).await
    }

    pub async fn record_launch(&self, record: &LaunchRecord) -> Result<(), RegistryError> {
        debug!(table = %self.launches_table, mint = %record.mint, "Recording launch");
        let request = self
            .authorized(self.http.post(self.table_url(&self.launches_table)))
            .header("Prefer", "return=minimal")
            .json(record);
        self.execute(request).await?;
        Ok(())
    }

    async fn list(&self, table: &str, limit: usize) -> Result<Vec<LaunchRecord>, RegistryError> {
        debug!(table, limit, "Listing launches");
        let limit = limit.to_string();
        let request = self.authorized(self.http.get(self.table_url(table))).query(&[
            ("select", LAUNCH_COLUMNS),
            ("order", "created_at.desc"),
            ("limit", limit.as_str()),
        ]);
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header(header::ACCEPT, "application/json")
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, RegistryError> {
        let timer = Timer::new();
        let response = request.send().await;
        timer.observe_duration(&metrics().http_latency);

        let response = response.inspect_err(|_| metrics().registry_errors.inc())?;
        let status = response.status();
        if !status.is_success() {
            metrics().registry_errors.inc();
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Registry request failed");
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
