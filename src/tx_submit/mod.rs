//! Resilient transaction submission
//!
//! ## Architecture
//!
//! - **errors**: ledger, signing and submission error taxonomy
//! - **ledger**: the `LedgerClient` seam plus checkpoints and send options
//! - **draft**: drafts, signed transactions, builder and signer seams
//! - **classify**: expired-blockhash detection for the rebuild decision
//! - **submitter**: build → sign → send → confirm with one rebuild
//! - **rpc_ledger**: production `LedgerClient` over Solana JSON-RPC
//!
//! ## Retry layers
//!
//! Transport-level retransmission (`SendOptions::max_retries`) is handled by
//! the RPC node and never rebuilds. The submitter rebuilds the whole draft at
//! most once, and only for an expired blockhash.

pub mod classify;
pub mod draft;
pub mod errors;
pub mod ledger;
pub mod rpc_ledger;
pub mod submitter;

pub use classify::{classify, FailureClass};
pub use draft::{sign_slot, Draft, DraftBuilder, SignedTransaction, TransactionSigner};
pub use errors::{LedgerError, LedgerErrorKind, SignError, SubmitError};
pub use ledger::{Checkpoint, Commitment, LedgerClient, SendOptions};
pub use rpc_ledger::RpcLedgerClient;
pub use submitter::{ResilientSubmitter, MAX_ATTEMPTS};
