//! Drafts, signed transactions and the collaborators that produce them

use super::errors::SignError;
use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::{Signature, Signer},
    transaction::VersionedTransaction,
};

/// Unsigned transaction bound to the blockhash in its message
///
/// A draft may already carry co-signatures (e.g. a freshly generated mint
/// key) but still needs the submitting party's signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    transaction: VersionedTransaction,
}

impl Draft {
    pub fn new(transaction: VersionedTransaction) -> Self {
        Self { transaction }
    }

    /// Wrap a bare message, reserving one empty slot per required signer
    pub fn from_message(message: VersionedMessage) -> Self {
        let required = message.header().num_required_signatures as usize;
        Self {
            transaction: VersionedTransaction {
                signatures: vec![Signature::default(); required],
                message,
            },
        }
    }

    pub fn blockhash(&self) -> Hash {
        *self.transaction.message.recent_blockhash()
    }

    /// Keys that must sign before the transaction is valid
    pub fn required_signers(&self) -> &[Pubkey] {
        let required = self.transaction.message.header().num_required_signatures as usize;
        let keys = self.transaction.message.static_account_keys();
        &keys[..required.min(keys.len())]
    }

    pub fn transaction(&self) -> &VersionedTransaction {
        &self.transaction
    }

    pub fn transaction_mut(&mut self) -> &mut VersionedTransaction {
        &mut self.transaction
    }

    pub fn into_transaction(self) -> VersionedTransaction {
        self.transaction
    }
}

/// Fully signed transaction ready for submission
///
/// Immutable: a new blockhash means a new draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    transaction: VersionedTransaction,
}

impl SignedTransaction {
    pub fn new(transaction: VersionedTransaction) -> Self {
        Self { transaction }
    }

    /// Fee-payer signature, which identifies the transaction on chain
    pub fn signature(&self) -> Signature {
        self.transaction
            .signatures
            .first()
            .copied()
            .unwrap_or_default()
    }

    pub fn blockhash(&self) -> Hash {
        *self.transaction.message.recent_blockhash()
    }

    pub fn transaction(&self) -> &VersionedTransaction {
        &self.transaction
    }
}

/// Factory producing a fresh draft against the current blockhash
///
/// Called once per attempt, so implementations must tolerate being invoked
/// twice for one submission.
#[async_trait]
pub trait DraftBuilder: Send + Sync {
    async fn build(&self) -> anyhow::Result<Draft>;
}

/// Signing authority (wallet, custodian, local key)
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign(&self, draft: Draft) -> Result<SignedTransaction, SignError>;
}

/// Fill `signer`'s slot in a partially signed transaction
pub fn sign_slot<S>(transaction: &mut VersionedTransaction, signer: &S) -> Result<(), SignError>
where
    S: Signer + ?Sized,
{
    let pubkey = signer.pubkey();
    let required = transaction.message.header().num_required_signatures as usize;
    let position = transaction
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == pubkey)
        .ok_or(SignError::NotASigner(pubkey))?;

    if transaction.signatures.len() < required {
        transaction.signatures.resize(required, Signature::default());
    }

    let message_bytes = transaction.message.serialize();
    transaction.signatures[position] = signer
        .try_sign_message(&message_bytes)
        .map_err(|e| SignError::Failed(e.to_string()))?;
    Ok(())
}
