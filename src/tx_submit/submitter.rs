//! Resilient transaction submission
//!
//! One call builds, signs, submits and confirms a transaction. If the
//! blockhash expires between build and confirmation, the whole draft is
//! rebuilt and resubmitted exactly once. Every other failure is terminal and
//! comes back annotated with whatever execution logs could be recovered.
//!
//! The submitter holds no mutable state: concurrent `submit` calls share only
//! the ledger client.

use super::classify::{classify, FailureClass};
use super::draft::{DraftBuilder, SignedTransaction, TransactionSigner};
use super::errors::{LedgerError, SubmitError};
use super::ledger::{Commitment, LedgerClient, SendOptions};
use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;

use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// First attempt plus one rebuild
pub const MAX_ATTEMPTS: u32 = 2;

/// Submitter that recovers once from an expired blockhash
#[derive(Clone)]
pub struct ResilientSubmitter {
    ledger: Arc<dyn LedgerClient>,
    send_options: SendOptions,
    default_commitment: Commitment,
}

impl ResilientSubmitter {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            send_options: SendOptions::default(),
            default_commitment: Commitment::default(),
        }
    }

    pub fn with_send_options(mut self, send_options: SendOptions) -> Self {
        self.send_options = send_options;
        self
    }

    /// Commitment used when `submit` is called without one
    pub fn with_default_commitment(mut self, commitment: Commitment) -> Self {
        self.default_commitment = commitment;
        self
    }

    /// Build, sign, submit and confirm a transaction
    ///
    /// `builder` and `signer` are invoked once per attempt, so at most twice.
    /// Signing refusals and build failures are returned unchanged.
    pub async fn submit(
        &self,
        builder: &dyn DraftBuilder,
        signer: &dyn TransactionSigner,
        commitment: Option<Commitment>,
    ) -> Result<Signature, SubmitError> {
        self.submit_in(builder, signer, commitment, TraceContext::new())
            .await
    }

    /// [`submit`](Self::submit) recorded under a child of `parent`'s trace
    pub async fn submit_traced(
        &self,
        builder: &dyn DraftBuilder,
        signer: &dyn TransactionSigner,
        commitment: Option<Commitment>,
        parent: &TraceContext,
    ) -> Result<Signature, SubmitError> {
        self.submit_in(builder, signer, commitment, parent.child_span())
            .await
    }

    async fn submit_in(
        &self,
        builder: &dyn DraftBuilder,
        signer: &dyn TransactionSigner,
        commitment: Option<Commitment>,
        trace: TraceContext,
    ) -> Result<Signature, SubmitError> {
        let commitment = commitment.unwrap_or(self.default_commitment);
        let span = tracing::info_span!(
            "submit",
            trace_id = %trace.trace_id,
            span_id = %trace.span_id,
            parent_span_id = trace.parent_span_id.as_deref(),
            correlation_id = %trace.correlation_id(),
            signer = %signer.pubkey(),
            commitment = %commitment,
        );

        let timer = Timer::new();
        let result = self
            .submit_with_rebuild(builder, signer, commitment)
            .instrument(span)
            .await;
        timer.observe_duration(&metrics().submit_latency);

        match &result {
            Ok(_) => metrics().submit_success.inc(),
            Err(e) => metrics()
                .submit_failures
                .with_label_values(&[e.category()])
                .inc(),
        }
        result
    }

    async fn submit_with_rebuild(
        &self,
        builder: &dyn DraftBuilder,
        signer: &dyn TransactionSigner,
        commitment: Commitment,
    ) -> Result<Signature, SubmitError> {
        let mut attempt = 1;
        loop {
            metrics().submit_attempts.inc();
            let signed = self.build_and_sign(builder, signer, attempt).await?;

            let failure = match self.send_and_confirm(&signed, commitment).await {
                Ok(signature) => {
                    info!(%signature, attempt, "Transaction confirmed");
                    return Ok(signature);
                }
                Err(e) => e,
            };

            match classify(&failure) {
                FailureClass::ExpiredCheckpoint if attempt < MAX_ATTEMPTS => {
                    warn!(
                        attempt,
                        stale_blockhash = %signed.blockhash(),
                        error = %failure,
                        "Blockhash expired, rebuilding transaction with fresh blockhash"
                    );
                    metrics().submit_rebuilds.inc();
                    attempt += 1;
                }
                FailureClass::ExpiredCheckpoint => {
                    warn!(attempt, error = %failure, "Blockhash expired again after rebuild");
                    return Err(SubmitError::BlockhashExpired {
                        attempt,
                        source: failure,
                    });
                }
                FailureClass::Terminal => {
                    return Err(self.annotate(failure, attempt).await);
                }
            }
        }
    }

    async fn build_and_sign(
        &self,
        builder: &dyn DraftBuilder,
        signer: &dyn TransactionSigner,
        attempt: u32,
    ) -> Result<SignedTransaction, SubmitError> {
        let draft = builder.build().await.map_err(SubmitError::Build)?;
        debug!(attempt, blockhash = %draft.blockhash(), "Draft built");

        let signed = signer.sign(draft).await?;
        debug!(attempt, signature = %signed.signature(), "Draft signed");
        Ok(signed)
    }

    /// Fetch checkpoint, submit, then confirm against that checkpoint
    async fn send_and_confirm(
        &self,
        signed: &SignedTransaction,
        commitment: Commitment,
    ) -> Result<Signature, LedgerError> {
        let checkpoint = self.ledger.latest_checkpoint(commitment).await?;
        let signature = self
            .ledger
            .send_raw(signed, &self.send_options, commitment)
            .await?;
        debug!(
            %signature,
            blockhash = %checkpoint.blockhash,
            last_valid_block_height = checkpoint.last_valid_block_height,
            "Transaction sent, awaiting confirmation"
        );

        self.ledger
            .confirm(&signature, &checkpoint, commitment)
            .await
            .map_err(|e| match e.signature {
                Some(_) => e,
                None => e.with_signature(signature),
            })?;
        Ok(signature)
    }

    /// Attach best-effort execution logs to a terminal failure
    async fn annotate(&self, failure: LedgerError, attempt: u32) -> SubmitError {
        let logs = match self.ledger.execution_logs(&failure).await {
            Ok(logs) => {
                if !logs.is_empty() {
                    warn!(attempt, logs = ?logs, "On-chain logs");
                }
                logs
            }
            Err(e) => {
                debug!(error = %e, "Execution log extraction failed");
                Vec::new()
            }
        };

        SubmitError::Rejected {
            attempt,
            source: failure,
            logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        test_checkpoint, test_hash, test_signature, CapturedLogs, CountingBuilder,
        CountingSigner, ScriptedLedger,
    };
    use crate::tx_submit::{Checkpoint, LedgerErrorKind, SignError};

    fn submitter(ledger: &ScriptedLedger) -> ResilientSubmitter {
        ResilientSubmitter::new(Arc::new(ledger.clone()))
    }

    #[tokio::test]
    async fn test_success_runs_single_cycle() {
        let ledger = ScriptedLedger::new().with_checkpoints(vec![test_checkpoint(1, 150)]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let signature = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap();

        assert_eq!(builder.get_build_count().await, 1);
        assert_eq!(signer.get_sign_count().await, 1);
        assert_eq!(ledger.send_count().await, 1);
        assert_eq!(ledger.confirm_count().await, 1);
        assert_eq!(ledger.get_log_calls().await, 0);

        let sent = ledger.sent.lock().await;
        assert_eq!(signature, sent[0].signature());

        let anchors = ledger.confirm_anchors.lock().await;
        assert_eq!(anchors[0].0, signature);
        assert_eq!(anchors[0].1, test_checkpoint(1, 150));
        assert_eq!(anchors[0].2, Commitment::Confirmed);
    }

    #[tokio::test]
    async fn test_returns_signature_reported_by_ledger() {
        let ledger = ScriptedLedger::new().with_send_results(vec![Ok(Some(test_signature(9)))]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let signature = submitter(&ledger)
            .submit(&builder, &signer, Some(Commitment::Finalized))
            .await
            .unwrap();

        assert_eq!(signature, test_signature(9));
        let anchors = ledger.confirm_anchors.lock().await;
        assert_eq!(anchors[0].2, Commitment::Finalized);
        // Preflight simulates at the requested commitment too
        assert_eq!(
            *ledger.send_commitments.lock().await,
            vec![Commitment::Finalized]
        );
    }

    #[tokio::test]
    async fn test_expired_blockhash_rebuilds_once_with_fresh_checkpoint() {
        let ledger = ScriptedLedger::new()
            .with_checkpoints(vec![test_checkpoint(1, 100), test_checkpoint(2, 250)])
            .with_send_results(vec![Ok(Some(test_signature(1))), Ok(Some(test_signature(2)))])
            .with_confirm_results(vec![
                Err(LedgerError::unknown("Blockhash not found")),
                Ok(()),
            ]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1), test_hash(2)]);

        let signature = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap();

        assert_eq!(signature, test_signature(2));
        assert_eq!(builder.get_build_count().await, 2);
        assert_eq!(signer.get_sign_count().await, 2);
        assert_eq!(
            *signer.signed_blockhashes.lock().await,
            vec![test_hash(1), test_hash(2)]
        );
        assert_eq!(ledger.get_checkpoint_calls().await, 2);
        assert_eq!(ledger.get_log_calls().await, 0);

        let anchors = ledger.confirm_anchors.lock().await;
        assert_eq!(anchors[0].1, test_checkpoint(1, 100));
        assert_eq!(anchors[1].1, test_checkpoint(2, 250));
    }

    #[tokio::test]
    async fn test_rebuild_reuses_send_options() {
        let options = SendOptions {
            skip_preflight: false,
            max_retries: 5,
        };
        let ledger = ScriptedLedger::new().with_send_results(vec![
            Err(LedgerError::unknown("BLOCKHASH NOT FOUND")),
            Ok(None),
        ]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1), test_hash(2)]);

        submitter(&ledger)
            .with_send_options(options)
            .submit(&builder, &signer, None)
            .await
            .unwrap();

        assert_eq!(*ledger.send_options.lock().await, vec![options, options]);
        // Confirmation only runs for the accepted submission
        assert_eq!(ledger.confirm_count().await, 1);
    }

    #[tokio::test]
    async fn test_structured_expired_kind_triggers_rebuild() {
        let ledger = ScriptedLedger::new().with_send_results(vec![
            Err(LedgerError::new(
                LedgerErrorKind::BlockhashNotFound,
                "Transaction simulation failed",
            )),
            Ok(None),
        ]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1), test_hash(2)]);

        assert!(submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .is_ok());
        assert_eq!(builder.get_build_count().await, 2);
    }

    #[tokio::test]
    async fn test_second_expiry_is_terminal() {
        let ledger = ScriptedLedger::new()
            .with_send_results(vec![Err(LedgerError::unknown("blockhash not found"))]);
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1), test_hash(2)]);

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::BlockhashExpired { attempt: 2, .. }));
        assert!(err.to_string().contains("blockhash not found"));
        assert_eq!(builder.get_build_count().await, 2);
        assert_eq!(signer.get_sign_count().await, 2);
        assert_eq!(ledger.send_count().await, 2);
    }

    #[tokio::test]
    async fn test_unrelated_failure_extracts_logs_without_rebuild() {
        let logs = vec![
            "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P invoke [1]".to_string(),
            "Program log: Error: insufficient funds".to_string(),
        ];
        let ledger = ScriptedLedger::new()
            .with_send_results(vec![Err(LedgerError::rejected(
                "Transaction simulation failed: insufficient funds",
            ))])
            .with_logs(Ok(logs.clone()));
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("insufficient funds"));
        assert_eq!(err.logs(), logs.as_slice());
        assert_eq!(ledger.get_log_calls().await, 1);
        assert_eq!(builder.get_build_count().await, 1);
        assert_eq!(signer.get_sign_count().await, 1);
    }

    #[tokio::test]
    async fn test_log_extraction_failure_is_swallowed() {
        let ledger = ScriptedLedger::new()
            .with_confirm_results(vec![Err(LedgerError::rejected(
                "custom program error: 0x1771",
            ))])
            .with_logs(Err(LedgerError::transport("error sending request: timed out")));
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "custom program error: 0x1771");
        assert!(err.logs().is_empty());
        assert_eq!(ledger.get_log_calls().await, 1);
        // Confirmation failures carry the submitted signature
        assert!(err.ledger_error().unwrap().signature.is_some());
    }

    #[tokio::test]
    async fn test_failure_after_rebuild_is_annotated() {
        let ledger = ScriptedLedger::new()
            .with_send_results(vec![
                Err(LedgerError::unknown("Blockhash not found")),
                Err(LedgerError::rejected("insufficient funds")),
            ])
            .with_logs(Ok(vec!["Program log: insufficient lamports".to_string()]));
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1), test_hash(2)]);

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Rejected { attempt: 2, .. }));
        assert_eq!(ledger.get_log_calls().await, 1);
        assert_eq!(builder.get_build_count().await, 2);
    }

    #[tokio::test]
    async fn test_signing_refusal_propagates_unchanged() {
        let ledger = ScriptedLedger::new();
        let signer = CountingSigner::new_refusing();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Signing(SignError::Rejected(_))));
        assert_eq!(ledger.send_count().await, 0);
        assert_eq!(ledger.get_checkpoint_calls().await, 0);
        assert_eq!(signer.get_sign_count().await, 1);
    }

    #[tokio::test]
    async fn test_build_failure_propagates() {
        let ledger = ScriptedLedger::new();
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new_failing(signer.pubkey());

        let err = submitter(&ledger)
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Build(_)));
        assert!(err.to_string().contains("PumpPortal API failed"));
        assert_eq!(signer.get_sign_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkpoint_fetch_failure_is_classified() {
        let ledger = ScriptedLedger::new();
        let failing = FailingCheckpointLedger(ledger.clone());
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);

        let err = ResilientSubmitter::new(Arc::new(failing))
            .submit(&builder, &signer, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Rejected { attempt: 1, .. }));
        assert_eq!(ledger.send_count().await, 0);
    }

    #[tokio::test]
    async fn test_traced_submit_joins_parent_trace() {
        let (logs, _guard) = CapturedLogs::install();
        let ledger = ScriptedLedger::new();
        let signer = CountingSigner::new();
        let builder = CountingBuilder::new(signer.pubkey(), vec![test_hash(1)]);
        let parent = TraceContext::new();

        submitter(&ledger)
            .submit_traced(&builder, &signer, None, &parent)
            .await
            .unwrap();

        let output = logs.contents();
        let confirmed = output
            .lines()
            .find(|line| line.contains("Transaction confirmed"))
            .unwrap();
        assert!(confirmed.contains(&format!("trace_id={}", parent.trace_id)));
        assert!(confirmed.contains(&format!("correlation_id={}", parent.correlation_id)));
        assert!(confirmed.contains(&parent.span_id));
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_independent() {
        let ledger = ScriptedLedger::new();
        let submitter = submitter(&ledger);
        let signer_a = CountingSigner::new();
        let signer_b = CountingSigner::new();
        let builder_a = CountingBuilder::new(signer_a.pubkey(), vec![test_hash(1)]);
        let builder_b = CountingBuilder::new(signer_b.pubkey(), vec![test_hash(2)]);

        let (a, b) = tokio::join!(
            submitter.submit(&builder_a, &signer_a, None),
            submitter.submit(&builder_b, &signer_b, None),
        );

        assert_ne!(a.unwrap(), b.unwrap());
        assert_eq!(ledger.send_count().await, 2);
    }

    struct FailingCheckpointLedger(ScriptedLedger);

    #[async_trait::async_trait]
    impl LedgerClient for FailingCheckpointLedger {
        async fn latest_checkpoint(
            &self,
            _commitment: Commitment,
        ) -> Result<Checkpoint, LedgerError> {
            Err(LedgerError::transport("error sending request for url"))
        }

        async fn send_raw(
            &self,
            transaction: &SignedTransaction,
            options: &SendOptions,
            commitment: Commitment,
        ) -> Result<Signature, LedgerError> {
            self.0.send_raw(transaction, options, commitment).await
        }

        async fn confirm(
            &self,
            signature: &Signature,
            checkpoint: &Checkpoint,
            commitment: Commitment,
        ) -> Result<(), LedgerError> {
            self.0.confirm(signature, checkpoint, commitment).await
        }
    }
}
