//! Error types for the token creation collaborators

use crate::tx_submit::{SignError, SubmitError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PumpError {
    /// Request failed validation before any network call
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed to load token image: {0}")]
    Image(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Metadata pinning service returned a non-success status
    #[error("Failed to upload metadata to IPFS: {status} {body}")]
    Pinning { status: u16, body: String },

    /// Token creation service returned a non-success status
    #[error("PumpPortal API failed: {status} {body}")]
    Portal { status: u16, body: String },

    /// Token lookup returned a non-success status
    #[error("Failed to fetch token info: {status} {body}")]
    TokenInfo { status: u16, body: String },

    #[error("Unexpected create-tx response shape")]
    UnexpectedResponseShape,

    /// Response had a known shape but its payload didn't decode
    #[error("Failed to decode create-tx response: {0}")]
    Decode(String),

    /// The mint key could not co-sign the draft
    #[error("Mint co-signing failed: {0}")]
    MintSigning(#[from] SignError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl PumpError {
    pub fn missing_fields() -> Self {
        Self::InvalidRequest("Missing required fields".to_string())
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Image(_) => "image",
            Self::Http(_) => "http",
            Self::Pinning { .. } => "pinning",
            Self::Portal { .. } | Self::UnexpectedResponseShape | Self::Decode(_) => "portal",
            Self::TokenInfo { .. } => "token_info",
            Self::MintSigning(_) => "mint_signing",
            Self::Submit(e) => e.category(),
        }
    }
}
