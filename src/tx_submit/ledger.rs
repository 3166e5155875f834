//! Ledger client contract consumed by the submitter

use super::draft::SignedTransaction;
use super::errors::LedgerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    signature::Signature,
};
use std::fmt;
use std::str::FromStr;

/// Finality level requested for confirmation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    pub fn to_config(self) -> CommitmentConfig {
        match self {
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!(
                "unsupported commitment '{}': expected 'confirmed' or 'finalized'",
                other
            )),
        }
    }
}

/// Recent blockhash plus the last block height at which it is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Options forwarded to raw submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Skip local preflight simulation before relay
    #[serde(default)]
    pub skip_preflight: bool,

    /// Transport-level retransmissions performed by the RPC node
    #[serde(default = "default_send_max_retries")]
    pub max_retries: usize,
}

fn default_send_max_retries() -> usize {
    3
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            max_retries: default_send_max_retries(),
        }
    }
}

/// Network operations the submitter needs
///
/// Every method is one independent round trip. Implementations own their
/// own transport retries and timeouts.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch the latest blockhash and its expiry height
    async fn latest_checkpoint(&self, commitment: Commitment) -> Result<Checkpoint, LedgerError>;

    /// Submit signed transaction bytes, simulating at `commitment` unless
    /// preflight is skipped
    async fn send_raw(
        &self,
        transaction: &SignedTransaction,
        options: &SendOptions,
        commitment: Commitment,
    ) -> Result<Signature, LedgerError>;

    /// Wait until `signature` reaches `commitment`, or fail once the
    /// checkpoint's expiry height passes
    async fn confirm(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
        commitment: Commitment,
    ) -> Result<(), LedgerError>;

    /// Recover simulation/execution logs for a failed submission
    async fn execution_logs(&self, failure: &LedgerError) -> Result<Vec<String>, LedgerError> {
        failure
            .logs
            .clone()
            .ok_or_else(|| LedgerError::unknown("no execution logs attached to failure"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_defaults_to_confirmed() {
        assert_eq!(Commitment::default(), Commitment::Confirmed);
        assert_eq!(
            Commitment::default().to_config(),
            CommitmentConfig::confirmed()
        );
    }

    #[test]
    fn test_commitment_parsing() {
        assert_eq!("finalized".parse::<Commitment>(), Ok(Commitment::Finalized));
        assert_eq!("Confirmed".parse::<Commitment>(), Ok(Commitment::Confirmed));
        assert!("processed".parse::<Commitment>().is_err());
    }

    #[test]
    fn test_commitment_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            commitment: Commitment,
        }
        let parsed: Wrapper = toml::from_str("commitment = \"finalized\"").unwrap();
        assert_eq!(parsed.commitment, Commitment::Finalized);
    }

    #[test]
    fn test_send_options_defaults() {
        let opts = SendOptions::default();
        assert!(!opts.skip_preflight);
        assert_eq!(opts.max_retries, 3);
    }
}
