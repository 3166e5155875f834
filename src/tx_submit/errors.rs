//! Error types for the transaction submitter
//!
//! Three layers of errors meet here:
//! - [`LedgerError`]: what a [`LedgerClient`](super::LedgerClient) reports for
//!   checkpoint fetch, submission, confirmation and log lookups
//! - [`SignError`]: refusals or failures from the signing authority
//! - [`SubmitError`]: the terminal outcome handed back to callers of
//!   [`ResilientSubmitter::submit`](super::ResilientSubmitter::submit)

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

/// Structured failure category supplied by a ledger client
///
/// Clients that cannot tell categories apart report [`LedgerErrorKind::Unknown`]
/// and leave classification to message matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// The blockhash cited by the transaction is no longer recognised
    BlockhashNotFound,
    /// Ledger height passed the checkpoint's last valid block height
    BlockHeightExceeded,
    /// Transport-level failure after the client's own retransmissions
    Transport,
    /// The network (or preflight simulation) rejected the transaction
    Rejected,
    /// No structured category available
    Unknown,
}

impl LedgerErrorKind {
    /// Label used for metrics and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockhashNotFound => "blockhash_not_found",
            Self::BlockHeightExceeded => "block_height_exceeded",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

/// Failure reported by a ledger client
///
/// `message` is kept verbatim from the underlying client so callers can
/// always see the original text.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct LedgerError {
    pub kind: LedgerErrorKind,
    pub message: String,
    /// Execution logs already carried by the failure (preflight simulation)
    pub logs: Option<Vec<String>>,
    /// Signature of the submission this failure belongs to, if one was issued
    pub signature: Option<Signature>,
}

impl LedgerError {
    pub fn new(kind: LedgerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            logs: None,
            signature: None,
        }
    }

    /// Failure without a structured category
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Unknown, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Transport, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Rejected, message)
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// Signing authority errors
///
/// These are never classified or retried by the submitter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignError {
    /// The custodian declined to sign (e.g. user rejection)
    #[error("Signing request rejected: {0}")]
    Rejected(String),

    /// The signer's key is not one of the transaction's required signers
    #[error("Signer {0} is not a required signer of this transaction")]
    NotASigner(Pubkey),

    /// Signing could not be completed
    #[error("Signing failed: {0}")]
    Failed(String),
}

/// Terminal outcome of a submission
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The draft builder could not produce a transaction
    #[error("Failed to build transaction draft: {0:#}")]
    Build(#[source] anyhow::Error),

    /// Signing was refused or failed; propagated unchanged
    #[error(transparent)]
    Signing(#[from] SignError),

    /// The blockhash expired again after the single rebuild
    #[error("Blockhash expired after rebuild (attempt {attempt}): {source}")]
    BlockhashExpired {
        attempt: u32,
        #[source]
        source: LedgerError,
    },

    /// Any other ledger failure, annotated with recovered execution logs
    #[error("{source}{}", format_logs(.logs))]
    Rejected {
        attempt: u32,
        #[source]
        source: LedgerError,
        logs: Vec<String>,
    },
}

impl SubmitError {
    /// Underlying ledger failure, if the error came from the network
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            Self::BlockhashExpired { source, .. } | Self::Rejected { source, .. } => Some(source),
            Self::Build(_) | Self::Signing(_) => None,
        }
    }

    /// Execution logs attached to the failure
    pub fn logs(&self) -> &[String] {
        match self {
            Self::Rejected { logs, .. } => logs,
            _ => &[],
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Signing(_) => "signing",
            Self::BlockhashExpired { .. } => "blockhash_expired",
            Self::Rejected { .. } => "rejected",
        }
    }
}

fn format_logs(logs: &[String]) -> String {
    if logs.is_empty() {
        String::new()
    } else {
        format!("\nOn-chain logs:\n  {}", logs.join("\n  "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_display_is_verbatim() {
        let err = LedgerError::unknown("Transaction simulation failed: insufficient funds");
        assert_eq!(
            err.to_string(),
            "Transaction simulation failed: insufficient funds"
        );
    }

    #[test]
    fn test_rejected_display_keeps_message_and_appends_logs() {
        let err = SubmitError::Rejected {
            attempt: 1,
            source: LedgerError::rejected("insufficient funds"),
            logs: vec![
                "Program 11111111111111111111111111111111 invoke [1]".to_string(),
                "Transfer: insufficient lamports".to_string(),
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("insufficient funds"));
        assert!(rendered.contains("On-chain logs:"));
        assert!(rendered.contains("Transfer: insufficient lamports"));
        assert_eq!(err.logs().len(), 2);
    }

    #[test]
    fn test_rejected_without_logs_is_bare_message() {
        let err = SubmitError::Rejected {
            attempt: 1,
            source: LedgerError::rejected("custom program error: 0x1771"),
            logs: vec![],
        };
        assert_eq!(err.to_string(), "custom program error: 0x1771");
    }

    #[test]
    fn test_signing_error_is_transparent() {
        let err: SubmitError = SignError::Rejected("User rejected the request".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Signing request rejected: User rejected the request"
        );
        assert_eq!(err.category(), "signing");
        assert!(err.ledger_error().is_none());
    }

    #[test]
    fn test_categories() {
        let expired = SubmitError::BlockhashExpired {
            attempt: 2,
            source: LedgerError::new(LedgerErrorKind::BlockhashNotFound, "Blockhash not found"),
        };
        assert_eq!(expired.category(), "blockhash_expired");
        assert!(expired.to_string().contains("Blockhash not found"));

        let build = SubmitError::Build(anyhow::anyhow!("PumpPortal API failed: 500"));
        assert_eq!(build.category(), "build");
        assert!(build.to_string().contains("PumpPortal API failed: 500"));
    }
}
