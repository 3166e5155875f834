//! Configuration module for the launchpad
//!
//! This module handles configuration loading from TOML files, `.env` files
//! and environment variables, and provides structured configuration types.

use crate::tx_submit::{Commitment, SendOptions};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Solana RPC configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Transaction submission configuration
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Token creation service configuration
    #[serde(default)]
    pub pump: PumpConfig,

    /// Launch registry configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Logging and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment for reads that don't specify one
    #[serde(default)]
    pub commitment: Commitment,

    /// Interval between signature status polls while confirming
    #[serde(default = "default_confirm_poll_interval")]
    pub confirm_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Confirmation commitment for submissions
    #[serde(default)]
    pub commitment: Commitment,

    /// Options forwarded to every raw send, rebuilds included
    #[serde(default)]
    pub send: SendOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Metadata pinning endpoint
    #[serde(default = "default_ipfs_url")]
    pub ipfs_url: String,

    /// Unsigned create-transaction endpoint
    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Token lookup endpoint; the mint address is appended as a path segment
    #[serde(default = "default_token_info_url")]
    pub token_info_url: String,

    /// Slippage tolerance in percent
    #[serde(default = "default_slippage")]
    pub slippage: u32,

    /// Priority fee in SOL
    #[serde(default = "default_priority_fee")]
    pub priority_fee: f64,

    #[serde(default = "default_pool")]
    pub pool: String,

    /// Website used when a launch request leaves it blank
    #[serde(default = "default_website")]
    pub default_website: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    #[serde(default)]
    pub url: Option<String>,

    /// Service-role key sent as `apikey` and bearer token
    #[serde(default)]
    pub service_role_key: Option<String>,

    #[serde(default = "default_launches_table")]
    pub launches_table: String,

    #[serde(default = "default_projects_table")]
    pub projects_table: String,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default = "default_explore_limit")]
    pub explore_limit: usize,

    /// HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,

    /// Base58 secret key; takes precedence over `keypair_path`
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Print the Prometheus text exposition after each command
    #[serde(default)]
    pub dump_metrics: bool,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_confirm_poll_interval() -> u64 { 500 }
fn default_ipfs_url() -> String { "https://pump.fun/api/ipfs".to_string() }
fn default_portal_url() -> String { "https://pumpportal.fun/api/trade-local".to_string() }
fn default_token_info_url() -> String { "https://frontend-api.pump.fun/coins".to_string() }
fn default_slippage() -> u32 { 10 }
fn default_priority_fee() -> f64 { 0.0005 }
fn default_pool() -> String { "pump".to_string() }
fn default_website() -> String { "https://gitr.fun".to_string() }
fn default_http_timeout() -> u64 { 30 }
fn default_launches_table() -> String { "project_launches".to_string() }
fn default_projects_table() -> String { "projects".to_string() }
fn default_recent_limit() -> usize { 12 }
fn default_explore_limit() -> usize { 50 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
            commitment: Commitment::default(),
            confirm_poll_interval_ms: default_confirm_poll_interval(),
        }
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            ipfs_url: default_ipfs_url(),
            portal_url: default_portal_url(),
            token_info_url: default_token_info_url(),
            slippage: default_slippage(),
            priority_fee: default_priority_fee(),
            pool: default_pool(),
            default_website: default_website(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            launches_table: default_launches_table(),
            projects_table: default_projects_table(),
            recent_limit: default_recent_limit(),
            explore_limit: default_explore_limit(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
            secret_key: None,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            dump_metrics: false,
            json_logs: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    ///
    /// A missing file falls back to defaults so env-only setups work.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("SOLANA_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_ROLE_KEY") {
            self.backend.service_role_key = Some(key);
        }
        if let Some(path) = lookup("WALLET_KEYPAIR_PATH") {
            self.wallet.keypair_path = path;
        }
        if let Some(secret) = lookup("WALLET_SECRET_KEY") {
            self.wallet.secret_key = Some(secret);
        }
    }

    /// Check values that serde can't
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.url.trim().is_empty() {
            anyhow::bail!("rpc.url must not be empty");
        }
        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be greater than zero");
        }
        if self.rpc.confirm_poll_interval_ms == 0 {
            anyhow::bail!("rpc.confirm_poll_interval_ms must be greater than zero");
        }
        if !self.pump.priority_fee.is_finite() || self.pump.priority_fee < 0.0 {
            anyhow::bail!("pump.priority_fee must be a non-negative number");
        }
        if self.pump.pool.trim().is_empty() {
            anyhow::bail!("pump.pool must not be empty");
        }
        if self.backend.recent_limit == 0 || self.backend.explore_limit == 0 {
            anyhow::bail!("backend limits must be greater than zero");
        }
        Ok(())
    }
}
