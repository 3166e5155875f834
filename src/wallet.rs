//! Wallet module: local keypair loading and signing

use crate::tx_submit::{sign_slot, Draft, SignError, SignedTransaction, TransactionSigner};
use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Signing authority backed by a local keypair
///
/// Fills only its own signature slot, so drafts may arrive already
/// co-signed (e.g. by a mint key).
#[derive(Clone)]
pub struct WalletSigner {
    keypair: Arc<Keypair>,
}

impl WalletSigner {
    /// Load a keypair file: 64 raw bytes or a Solana CLI JSON array
    pub fn from_file(path: &str) -> Result<Self> {
        let keypair = load_keypair(path)?;
        debug!(pubkey = %keypair.pubkey(), "Loaded wallet keypair");
        Ok(Self::from_keypair(keypair))
    }

    /// Load a base58-encoded 64-byte secret key, as exported by browser wallets
    pub fn from_base58(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .context("Failed to decode base58 secret key")?;
        if bytes.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
        }
        let keypair = keypair_from_bytes(&bytes).context("Invalid base58 secret key")?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

// Never prints secret key material
impl std::fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSigner")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

/// Read a keypair file in either supported format
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let path = expand_home(path);
    let keypair_bytes = std::fs::read(&path)
        .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

    if keypair_bytes.len() == 64 {
        // Raw bytes format - validate before conversion
        keypair_from_bytes(&keypair_bytes).context("Invalid keypair bytes")
    } else {
        let json: Vec<u8> =
            serde_json::from_slice(&keypair_bytes).context("Failed to parse keypair JSON")?;
        if json.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", json.len());
        }
        keypair_from_bytes(&json).context("Invalid keypair from JSON")
    }
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    if bytes.iter().all(|&b| b == 0) {
        anyhow::bail!("Invalid keypair: all-zero key rejected");
    }
    Keypair::try_from(bytes).map_err(|e| anyhow::anyhow!("{}", e))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[async_trait]
impl TransactionSigner for WalletSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign(&self, mut draft: Draft) -> Result<SignedTransaction, SignError> {
        sign_slot(draft.transaction_mut(), self.keypair.as_ref())?;

        let unsigned = draft
            .required_signers()
            .iter()
            .zip(&draft.transaction().signatures)
            .find(|(_, signature)| **signature == Signature::default())
            .map(|(key, _)| *key);
        if let Some(key) = unsigned {
            return Err(SignError::Failed(format!(
                "transaction is still missing a signature from {}",
                key
            )));
        }

        Ok(SignedTransaction::new(draft.into_transaction()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_message, test_hash};
    use std::io::Write;

    fn write_keypair_json(keypair: &Keypair) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes: Vec<u8> = keypair.to_bytes().to_vec();
        file.write_all(serde_json::to_string(&bytes).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn test_from_json_file() {
        let keypair = Keypair::new();
        let file = write_keypair_json(&keypair);

        let wallet = WalletSigner::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(TransactionSigner::pubkey(&wallet), keypair.pubkey());
    }

    #[test]
    fn test_from_raw_bytes_file() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&keypair.to_bytes()).unwrap();

        let wallet = WalletSigner::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.keypair().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_rejects_zero_and_short_keys() {
        let mut zero = tempfile::NamedTempFile::new().unwrap();
        zero.write_all(&[0u8; 64]).unwrap();
        let err = WalletSigner::from_file(zero.path().to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("all-zero"));

        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(b"[1,2,3]").unwrap();
        let err = WalletSigner::from_file(short.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("expected 64 bytes"));
    }

    #[test]
    fn test_from_base58() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();

        let wallet = WalletSigner::from_base58(&encoded).unwrap();
        assert_eq!(wallet.keypair().pubkey(), keypair.pubkey());

        let short = bs58::encode([7u8; 32]).into_string();
        assert!(WalletSigner::from_base58(&short).is_err());
        assert!(WalletSigner::from_base58("0OIl").is_err());
    }

    #[test]
    fn test_debug_shows_only_pubkey() {
        let keypair = Keypair::new();
        let secret = bs58::encode(keypair.to_bytes()).into_string();
        let wallet = WalletSigner::from_keypair(keypair);

        let rendered = format!("{:?}", wallet);
        assert!(rendered.contains(&wallet.keypair().pubkey().to_string()));
        assert!(!rendered.contains(&secret));
        assert!(!rendered.contains(&format!("{:?}", wallet.keypair().to_bytes())));
    }

    #[test]
    fn test_missing_file() {
        assert!(WalletSigner::from_file("/nonexistent/keypair.json").is_err());
    }

    #[tokio::test]
    async fn test_signs_own_slot_of_cosigned_draft() {
        let wallet = WalletSigner::from_keypair(Keypair::new());
        let mint = Keypair::new();
        let payer = wallet.keypair().pubkey();
        let mint_pubkey = mint.pubkey();

        let mut draft = Draft::from_message(sample_message(&payer, &[&mint_pubkey], test_hash(3)));
        sign_slot(draft.transaction_mut(), &mint).unwrap();

        let signed = wallet.sign(draft).await.unwrap();
        let tx = signed.transaction();
        let message_bytes = tx.message.serialize();

        assert_eq!(tx.signatures.len(), 2);
        assert!(tx.signatures[0].verify(payer.as_ref(), &message_bytes));
        assert!(tx.signatures[1].verify(mint_pubkey.as_ref(), &message_bytes));
        assert_eq!(signed.signature(), tx.signatures[0]);
        assert_eq!(signed.blockhash(), test_hash(3));
    }

    #[tokio::test]
    async fn test_refuses_foreign_draft() {
        let wallet = WalletSigner::from_keypair(Keypair::new());
        let stranger = Keypair::new().pubkey();
        let draft = Draft::from_message(sample_message(&stranger, &[], test_hash(1)));

        let err = wallet.sign(draft).await.unwrap_err();
        assert_eq!(err, SignError::NotASigner(wallet.keypair().pubkey()));
    }

    #[tokio::test]
    async fn test_missing_cosignature_fails() {
        let wallet = WalletSigner::from_keypair(Keypair::new());
        let payer = wallet.keypair().pubkey();
        let mint = Keypair::new().pubkey();
        let draft = Draft::from_message(sample_message(&payer, &[&mint], test_hash(1)));

        let err = wallet.sign(draft).await.unwrap_err();
        assert!(matches!(err, SignError::Failed(msg) if msg.contains(&mint.to_string())));
    }
}
