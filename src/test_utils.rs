//! Test Utilities Module
//!
//! Recording stand-ins for the submitter's collaborators: a scripted ledger,
//! a counting draft builder and a counting signer. Every stand-in records how
//! often it was invoked so tests can assert exact call counts. A log capture
//! helper lets tests inspect span fields.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::tx_submit::{
    sign_slot, Checkpoint, Commitment, Draft, DraftBuilder, LedgerClient, LedgerError,
    SendOptions, SignError, SignedTransaction, TransactionSigner,
};
use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{Message, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Deterministic blockhash for tests
pub fn test_hash(seed: u8) -> Hash {
    Hash::new_from_array([seed; 32])
}

/// Deterministic signature for tests
pub fn test_signature(seed: u8) -> Signature {
    Signature::from([seed; 64])
}

/// Checkpoint with the given blockhash seed and expiry height
pub fn test_checkpoint(seed: u8, last_valid_block_height: u64) -> Checkpoint {
    Checkpoint {
        blockhash: test_hash(seed),
        last_valid_block_height,
    }
}

/// Single-instruction message paid by `payer` that also requires
/// `co_signers` to sign
pub fn sample_message(payer: &Pubkey, co_signers: &[&Pubkey], blockhash: Hash) -> VersionedMessage {
    let mut accounts = vec![AccountMeta::new(*payer, true)];
    accounts.extend(co_signers.iter().map(|key| AccountMeta::new(**key, true)));
    let ix = Instruction::new_with_bytes(Pubkey::new_from_array([7u8; 32]), b"create", accounts);
    VersionedMessage::Legacy(Message::new_with_blockhash(&[ix], Some(payer), &blockhash))
}

/// Formatted log output captured from the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events into a buffer until the guard drops
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Scripted ledger client
///
/// Each queue is consumed front to back; once a queue has a single entry
/// left, that entry is repeated.
#[derive(Clone)]
pub struct ScriptedLedger {
    checkpoints: Arc<Mutex<VecDeque<Checkpoint>>>,
    send_results: Arc<Mutex<VecDeque<std::result::Result<Option<Signature>, LedgerError>>>>,
    confirm_results: Arc<Mutex<VecDeque<std::result::Result<(), LedgerError>>>>,
    logs_result: Arc<Mutex<std::result::Result<Vec<String>, LedgerError>>>,

    pub checkpoint_calls: Arc<Mutex<usize>>,
    pub sent: Arc<Mutex<Vec<SignedTransaction>>>,
    pub send_options: Arc<Mutex<Vec<SendOptions>>>,
    pub send_commitments: Arc<Mutex<Vec<Commitment>>>,
    pub confirm_anchors: Arc<Mutex<Vec<(Signature, Checkpoint, Commitment)>>>,
    pub log_calls: Arc<Mutex<usize>>,
}

impl ScriptedLedger {
    /// Ledger that accepts and confirms everything
    pub fn new() -> Self {
        Self {
            checkpoints: Arc::new(Mutex::new(VecDeque::from([test_checkpoint(1, 100)]))),
            send_results: Arc::new(Mutex::new(VecDeque::from([Ok(None)]))),
            confirm_results: Arc::new(Mutex::new(VecDeque::from([Ok(())]))),
            logs_result: Arc::new(Mutex::new(Ok(vec![]))),
            checkpoint_calls: Arc::new(Mutex::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
            send_options: Arc::new(Mutex::new(Vec::new())),
            send_commitments: Arc::new(Mutex::new(Vec::new())),
            confirm_anchors: Arc::new(Mutex::new(Vec::new())),
            log_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_checkpoints(self, checkpoints: Vec<Checkpoint>) -> Self {
        *self.checkpoints.try_lock().expect("unshared") = checkpoints.into();
        self
    }

    /// `Ok(None)` echoes the transaction's own fee-payer signature
    pub fn with_send_results(
        self,
        results: Vec<std::result::Result<Option<Signature>, LedgerError>>,
    ) -> Self {
        *self.send_results.try_lock().expect("unshared") = results.into();
        self
    }

    pub fn with_confirm_results(self, results: Vec<std::result::Result<(), LedgerError>>) -> Self {
        *self.confirm_results.try_lock().expect("unshared") = results.into();
        self
    }

    pub fn with_logs(self, result: std::result::Result<Vec<String>, LedgerError>) -> Self {
        *self.logs_result.try_lock().expect("unshared") = result;
        self
    }

    pub async fn send_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn confirm_count(&self) -> usize {
        self.confirm_anchors.lock().await.len()
    }

    pub async fn get_checkpoint_calls(&self) -> usize {
        *self.checkpoint_calls.lock().await
    }

    pub async fn get_log_calls(&self) -> usize {
        *self.log_calls.lock().await
    }

    fn next<T: Clone>(queue: &mut VecDeque<T>) -> T {
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty")
        } else {
            queue.front().cloned().expect("script must not be empty")
        }
    }
}

impl Default for ScriptedLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn latest_checkpoint(
        &self,
        _commitment: Commitment,
    ) -> std::result::Result<Checkpoint, LedgerError> {
        *self.checkpoint_calls.lock().await += 1;
        Ok(Self::next(&mut *self.checkpoints.lock().await))
    }

    async fn send_raw(
        &self,
        transaction: &SignedTransaction,
        options: &SendOptions,
        commitment: Commitment,
    ) -> std::result::Result<Signature, LedgerError> {
        self.sent.lock().await.push(transaction.clone());
        self.send_options.lock().await.push(*options);
        self.send_commitments.lock().await.push(commitment);
        match Self::next(&mut *self.send_results.lock().await) {
            Ok(Some(signature)) => Ok(signature),
            Ok(None) => Ok(transaction.signature()),
            Err(e) => Err(e),
        }
    }

    async fn confirm(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
        commitment: Commitment,
    ) -> std::result::Result<(), LedgerError> {
        self.confirm_anchors
            .lock()
            .await
            .push((*signature, *checkpoint, commitment));
        Self::next(&mut *self.confirm_results.lock().await)
    }

    async fn execution_logs(
        &self,
        _failure: &LedgerError,
    ) -> std::result::Result<Vec<String>, LedgerError> {
        *self.log_calls.lock().await += 1;
        self.logs_result.lock().await.clone()
    }
}

/// Draft builder that stamps each draft with the next scripted blockhash
#[derive(Clone)]
pub struct CountingBuilder {
    payer: Pubkey,
    blockhashes: Vec<Hash>,
    should_fail: bool,
    pub build_count: Arc<Mutex<usize>>,
}

impl CountingBuilder {
    pub fn new(payer: Pubkey, blockhashes: Vec<Hash>) -> Self {
        Self {
            payer,
            blockhashes,
            should_fail: false,
            build_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn new_failing(payer: Pubkey) -> Self {
        let mut builder = Self::new(payer, vec![test_hash(1)]);
        builder.should_fail = true;
        builder
    }

    pub async fn get_build_count(&self) -> usize {
        *self.build_count.lock().await
    }
}

#[async_trait]
impl DraftBuilder for CountingBuilder {
    async fn build(&self) -> Result<Draft> {
        let mut count = self.build_count.lock().await;
        *count += 1;
        if self.should_fail {
            return Err(anyhow::anyhow!("PumpPortal API failed: 503 upstream unavailable"));
        }
        let index = (*count - 1).min(self.blockhashes.len() - 1);
        Ok(Draft::from_message(sample_message(
            &self.payer,
            &[],
            self.blockhashes[index],
        )))
    }
}

/// Signer over a local keypair that counts invocations
#[derive(Clone)]
pub struct CountingSigner {
    keypair: Arc<Keypair>,
    refuse: bool,
    pub sign_count: Arc<Mutex<usize>>,
    pub signed_blockhashes: Arc<Mutex<Vec<Hash>>>,
}

impl CountingSigner {
    pub fn new() -> Self {
        Self {
            keypair: Arc::new(Keypair::new()),
            refuse: false,
            sign_count: Arc::new(Mutex::new(0)),
            signed_blockhashes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Signer that behaves like a user rejecting the wallet prompt
    pub fn new_refusing() -> Self {
        let mut signer = Self::new();
        signer.refuse = true;
        signer
    }

    pub async fn get_sign_count(&self) -> usize {
        *self.sign_count.lock().await
    }
}

impl Default for CountingSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSigner for CountingSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign(&self, mut draft: Draft) -> std::result::Result<SignedTransaction, SignError> {
        *self.sign_count.lock().await += 1;
        if self.refuse {
            return Err(SignError::Rejected("User rejected the request.".to_string()));
        }
        self.signed_blockhashes.lock().await.push(draft.blockhash());
        sign_slot(draft.transaction_mut(), self.keypair.as_ref())?;
        Ok(SignedTransaction::new(draft.into_transaction()))
    }
}
