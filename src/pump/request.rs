//! Token launch requests and their validation

use super::errors::PumpError;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;

/// Everything needed to launch one token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLaunchRequest {
    pub name: String,
    pub symbol: String,
    pub description: String,

    /// Creator wallet, base58
    pub creator: String,

    /// Image URL or local file path
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub twitter: Option<String>,

    #[serde(default)]
    pub telegram: Option<String>,

    /// Initial dev buy in SOL
    #[serde(default)]
    pub buy_amount: f64,
}

/// Where the token image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
    /// Uploaded as an empty PNG part
    None,
}

impl TokenLaunchRequest {
    /// Check required fields and return the parsed creator key
    pub fn validate(&self) -> Result<Pubkey, PumpError> {
        let required = [&self.name, &self.symbol, &self.description, &self.creator];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(PumpError::missing_fields());
        }

        if !self.buy_amount.is_finite() || self.buy_amount < 0.0 {
            return Err(PumpError::InvalidRequest(format!(
                "Invalid buy amount: {}",
                self.buy_amount
            )));
        }

        Pubkey::from_str(self.creator.trim()).map_err(|e| {
            PumpError::InvalidRequest(format!(
                "Invalid creator public key '{}': {}",
                self.creator, e
            ))
        })
    }

    pub fn image_source(&self) -> ImageSource {
        match self.image.as_deref().map(str::trim) {
            None | Some("") => ImageSource::None,
            Some(image) if image.starts_with("http://") || image.starts_with("https://") => {
                ImageSource::Url(image.to_string())
            }
            Some(path) => ImageSource::File(PathBuf::from(path)),
        }
    }

    /// Website, or `fallback` when blank
    pub fn website_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.website.as_deref().map(str::trim) {
            Some(site) if !site.is_empty() => site,
            _ => fallback,
        }
    }
}
