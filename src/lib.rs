//! Launchpad - token launches on Pump.fun with resilient submission
//!
//! This library exposes the submission core and its collaborators for the
//! binary and for integration tests.

pub mod backend;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod pump;
pub mod test_utils;
pub mod tx_submit;
pub mod wallet;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use tx_submit::{Commitment, ResilientSubmitter, SubmitError};
