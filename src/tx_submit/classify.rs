//! Failure classification for the rebuild decision
//!
//! A structured [`LedgerErrorKind::BlockhashNotFound`] is checked first.
//! The message is also matched case-insensitively against the RPC node's
//! "Blockhash not found" text, for clients that cannot categorise a failure.
//! Message matching is brittle (node wording can change), so clients should
//! fill in `kind` whenever the underlying error exposes it.

use super::errors::{LedgerError, LedgerErrorKind};

const EXPIRED_BLOCKHASH_PATTERN: &str = "blockhash not found";

/// What the submitter should do with a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Blockhash no longer recognised: rebuild from scratch
    ExpiredCheckpoint,
    /// Terminal: extract diagnostics and surface
    Terminal,
}

pub fn classify(error: &LedgerError) -> FailureClass {
    if error.kind == LedgerErrorKind::BlockhashNotFound
        || message_reports_expired_blockhash(&error.message)
    {
        FailureClass::ExpiredCheckpoint
    } else {
        FailureClass::Terminal
    }
}

/// Case-insensitive substring match on the node's error text
pub fn message_reports_expired_blockhash(message: &str) -> bool {
    message
        .to_ascii_lowercase()
        .contains(EXPIRED_BLOCKHASH_PATTERN)
}
