//! [`LedgerClient`] over the Solana JSON-RPC API
//!
//! Wraps the nonblocking `RpcClient`. Transport retransmission is delegated
//! to the RPC node via `max_retries`; this client adds confirmation polling
//! bounded by the checkpoint's last valid block height and maps
//! `ClientError`s into [`LedgerError`]s with a structured kind where the
//! error exposes one.

use super::draft::SignedTransaction;
use super::errors::{LedgerError, LedgerErrorKind};
use super::ledger::{Checkpoint, Commitment, LedgerClient, SendOptions};
use crate::config::RpcConfig;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    config::{RpcSendTransactionConfig, RpcTransactionConfig},
    request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::{signature::Signature, transaction::TransactionError};
use solana_transaction_status::{option_serializer::OptionSerializer, UiTransactionEncoding};
use std::time::Duration;
use tracing::{debug, trace};

pub struct RpcLedgerClient {
    client: RpcClient,
    poll_interval: Duration,
}

impl RpcLedgerClient {
    pub fn new(config: &RpcConfig) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.commitment.to_config(),
        );
        Self {
            client,
            poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        }
    }

}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn latest_checkpoint(&self, commitment: Commitment) -> Result<Checkpoint, LedgerError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment.to_config())
            .await
            .map_err(ledger_error_from_client)?;
        Ok(Checkpoint {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_raw(
        &self,
        transaction: &SignedTransaction,
        options: &SendOptions,
        commitment: Commitment,
    ) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(commitment.to_config().commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: Some(options.max_retries),
            ..RpcSendTransactionConfig::default()
        };

        self.client
            .send_transaction_with_config(transaction.transaction(), config)
            .await
            .map_err(|e| ledger_error_from_client(e).with_signature(transaction.signature()))
    }

    async fn confirm(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
        commitment: Commitment,
    ) -> Result<(), LedgerError> {
        let commitment_config = commitment.to_config();
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, commitment_config)
                .await
                .map_err(ledger_error_from_client)?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(tx_err)) => {
                    return Err(LedgerError::new(
                        kind_for_transaction_error(&tx_err),
                        format!("Transaction {} failed: {}", signature, tx_err),
                    )
                    .with_signature(*signature));
                }
                None => {}
            }

            let block_height = self
                .client
                .get_block_height_with_commitment(commitment_config)
                .await
                .map_err(ledger_error_from_client)?;
            if block_height > checkpoint.last_valid_block_height {
                return Err(LedgerError::new(
                    LedgerErrorKind::BlockHeightExceeded,
                    format!(
                        "Signature {} has expired: block height exceeded \
                         (height {} > last valid {})",
                        signature, block_height, checkpoint.last_valid_block_height
                    ),
                )
                .with_signature(*signature));
            }

            trace!(%signature, block_height, "Awaiting confirmation");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn execution_logs(&self, failure: &LedgerError) -> Result<Vec<String>, LedgerError> {
        if let Some(logs) = failure.logs.as_ref().filter(|logs| !logs.is_empty()) {
            return Ok(logs.clone());
        }

        let signature = failure
            .signature
            .ok_or_else(|| LedgerError::unknown("failure carries neither logs nor a signature"))?;
        debug!(%signature, "Fetching execution logs");

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.client.commitment()),
            max_supported_transaction_version: Some(0),
        };
        let confirmed = self
            .client
            .get_transaction_with_config(&signature, config)
            .await
            .map_err(ledger_error_from_client)?;

        match confirmed.transaction.meta.map(|meta| meta.log_messages) {
            Some(OptionSerializer::Some(logs)) => Ok(logs),
            _ => Err(LedgerError::unknown(format!(
                "no log messages recorded for {}",
                signature
            ))),
        }
    }
}

fn kind_for_transaction_error(err: &TransactionError) -> LedgerErrorKind {
    match err {
        TransactionError::BlockhashNotFound => LedgerErrorKind::BlockhashNotFound,
        _ => LedgerErrorKind::Rejected,
    }
}

/// Map a `ClientError`, preferring structured information over message text
pub fn ledger_error_from_client(err: ClientError) -> LedgerError {
    let message = err.to_string();

    let logs = match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.clone(),
        _ => None,
    };

    let kind = if let Some(tx_err) = err.get_transaction_error() {
        kind_for_transaction_error(&tx_err)
    } else {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => LedgerErrorKind::Transport,
            ClientErrorKind::RpcError(RpcError::RpcResponseError { .. }) => {
                LedgerErrorKind::Rejected
            }
            _ => LedgerErrorKind::Unknown,
        }
    };

    let mapped = LedgerError::new(kind, message);
    match logs {
        Some(logs) => mapped.with_logs(logs),
        None => mapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_submit::classify::{classify, FailureClass};

    #[test]
    fn test_blockhash_transaction_error_is_structured() {
        let err = ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::BlockhashNotFound,
        ));
        let mapped = ledger_error_from_client(err);
        assert_eq!(mapped.kind, LedgerErrorKind::BlockhashNotFound);
        assert_eq!(classify(&mapped), FailureClass::ExpiredCheckpoint);
    }

    #[test]
    fn test_other_transaction_error_is_rejected() {
        let err = ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::InsufficientFundsForFee,
        ));
        let mapped = ledger_error_from_client(err);
        assert_eq!(mapped.kind, LedgerErrorKind::Rejected);
        assert_eq!(classify(&mapped), FailureClass::Terminal);
    }

    #[test]
    fn test_rpc_response_error_keeps_message() {
        let rpc_err = RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed: Blockhash not found".to_string(),
            data: RpcResponseErrorData::Empty,
        };
        let mapped =
            ledger_error_from_client(ClientError::from(ClientErrorKind::RpcError(rpc_err)));

        assert_eq!(mapped.kind, LedgerErrorKind::Rejected);
        assert!(mapped.message.contains("Blockhash not found"));
        // Text fallback still catches it
        assert_eq!(classify(&mapped), FailureClass::ExpiredCheckpoint);
    }

    #[test]
    fn test_custom_error_is_unknown() {
        let err = ClientError::from(ClientErrorKind::Custom("node is behind".to_string()));
        let mapped = ledger_error_from_client(err);
        assert_eq!(mapped.kind, LedgerErrorKind::Unknown);
        assert!(mapped.logs.is_none());
    }

    #[tokio::test]
    async fn test_execution_logs_prefers_attached_logs() {
        let client = RpcLedgerClient::new(&RpcConfig::default());
        let failure = LedgerError::rejected("simulation failed")
            .with_logs(vec!["Program log: slippage exceeded".to_string()]);

        let logs = client.execution_logs(&failure).await.unwrap();
        assert_eq!(logs, vec!["Program log: slippage exceeded".to_string()]);
    }

    #[tokio::test]
    async fn test_execution_logs_without_signature_fails_softly() {
        let client = RpcLedgerClient::new(&RpcConfig::default());
        let failure = LedgerError::rejected("simulation failed");
        assert!(client.execution_logs(&failure).await.is_err());
    }
}
