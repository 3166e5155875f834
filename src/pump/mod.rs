//! Token creation through Pump.fun and PumpPortal
//!
//! - **request**: launch request validation
//! - **metadata**: image and metadata pinning
//! - **portal**: unsigned create-transaction retrieval and decoding
//! - **launch**: the mint-co-signing draft builder and the launch flow
//! - **token_info**: lookup of a launched token by mint

pub mod errors;
pub mod launch;
pub mod metadata;
pub mod portal;
pub mod request;
pub mod token_info;

pub use errors::PumpError;
pub use launch::{pump_url, LaunchDraftBuilder, LaunchOutcome, Launcher};
pub use metadata::{MetadataFields, MetadataPinner, PinnedMetadata};
pub use portal::{decode_create_response, CreatePayload, PumpPortalClient, TokenMetadataRef};
pub use request::{ImageSource, TokenLaunchRequest};
pub use token_info::{TokenInfo, TokenInfoClient};
