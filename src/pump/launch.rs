//! Token launch orchestration
//!
//! Metadata is pinned once per launch. The create transaction is fetched
//! fresh for every submission attempt and co-signed by a mint keypair that
//! is generated once, so a rebuild launches the same mint.

use super::errors::PumpError;
use super::metadata::{MetadataFields, MetadataPinner, PinnedMetadata};
use super::portal::{CreatePayload, PumpPortalClient, TokenMetadataRef};
use super::request::{ImageSource, TokenLaunchRequest};
use crate::backend::{LaunchRecord, LaunchRegistry};
use crate::config::Config;
use crate::metrics::metrics;
use crate::observability::TraceContext;
use crate::tx_submit::{sign_slot, Draft, DraftBuilder, ResilientSubmitter, TransactionSigner};

use async_trait::async_trait;
use reqwest::Client;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

const PUMP_COIN_URL: &str = "https://pump.fun/coin";

/// Draft builder for one token's create transaction
pub struct LaunchDraftBuilder {
    portal: Arc<PumpPortalClient>,
    payload: CreatePayload,
    mint: Arc<Keypair>,
}

impl LaunchDraftBuilder {
    pub fn new(portal: Arc<PumpPortalClient>, payload: CreatePayload, mint: Arc<Keypair>) -> Self {
        Self {
            portal,
            payload,
            mint,
        }
    }

    pub fn mint(&self) -> Pubkey {
        self.mint.pubkey()
    }
}

#[async_trait]
impl DraftBuilder for LaunchDraftBuilder {
    async fn build(&self) -> anyhow::Result<Draft> {
        let mut draft = self.portal.create_transaction(&self.payload).await?;
        sign_slot(draft.transaction_mut(), self.mint.as_ref())
            .map_err(PumpError::MintSigning)?;
        debug!(
            mint = %self.mint.pubkey(),
            blockhash = %draft.blockhash(),
            "Create transaction co-signed by mint"
        );
        Ok(draft)
    }
}

/// Result of a successful launch
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOutcome {
    pub signature: Signature,
    pub mint: Pubkey,
    pub metadata_uri: String,
    pub pump_url: String,
}

pub fn pump_url(mint: &Pubkey) -> String {
    format!("{}/{}", PUMP_COIN_URL, mint)
}

pub struct Launcher {
    pinner: MetadataPinner,
    portal: Arc<PumpPortalClient>,
    submitter: ResilientSubmitter,
    registry: Option<LaunchRegistry>,
    http: Client,
    config: Config,
}

impl Launcher {
    pub fn new(
        config: Config,
        submitter: ResilientSubmitter,
        registry: Option<LaunchRegistry>,
    ) -> Result<Self, PumpError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.pump.timeout_secs))
            .build()?;
        Ok(Self {
            pinner: MetadataPinner::new(&config.pump)?,
            portal: Arc::new(PumpPortalClient::new(&config.pump)?),
            submitter,
            registry,
            http,
            config,
        })
    }

    /// Validate, pin metadata, submit the create transaction, record it
    ///
    /// The registry write happens after confirmation; its failure is logged
    /// and does not fail the launch.
    pub async fn launch(
        &self,
        request: &TokenLaunchRequest,
        signer: &dyn TransactionSigner,
    ) -> Result<LaunchOutcome, PumpError> {
        self.launch_with_mint(request, signer, Keypair::new()).await
    }

    /// Launch with a caller-supplied mint keypair (e.g. a vanity address)
    pub async fn launch_with_mint(
        &self,
        request: &TokenLaunchRequest,
        signer: &dyn TransactionSigner,
        mint: Keypair,
    ) -> Result<LaunchOutcome, PumpError> {
        let trace = TraceContext::new();
        let span = tracing::info_span!(
            "launch",
            trace_id = %trace.trace_id,
            span_id = %trace.span_id,
            correlation_id = %trace.correlation_id(),
            symbol = %request.symbol,
        );

        metrics().launches_total.inc();
        let result = self
            .launch_inner(request, signer, Arc::new(mint), &trace)
            .instrument(span)
            .await;
        if let Err(e) = &result {
            metrics().launches_failed.inc();
            warn!(category = e.category(), error = %e, "Launch failed");
        }
        result
    }

    async fn launch_inner(
        &self,
        request: &TokenLaunchRequest,
        signer: &dyn TransactionSigner,
        mint: Arc<Keypair>,
        trace: &TraceContext,
    ) -> Result<LaunchOutcome, PumpError> {
        let creator = request.validate()?;
        if creator != signer.pubkey() {
            return Err(PumpError::InvalidRequest(format!(
                "Creator {} does not match signing wallet {}",
                creator,
                signer.pubkey()
            )));
        }

        info!(creator = %creator, mint = %mint.pubkey(), "Launching token");

        let image = self.load_image(&request.image_source()).await?;
        let website = request.website_or(&self.config.pump.default_website).to_string();
        let fields = MetadataFields {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            description: request.description.clone(),
            twitter: request.twitter.clone().unwrap_or_default(),
            telegram: request.telegram.clone().unwrap_or_default(),
            website,
        };
        let pinned = self.pinner.pin(&fields, image).await?;

        let payload = CreatePayload::create(
            &self.config.pump,
            creator.to_string(),
            mint.pubkey().to_string(),
            TokenMetadataRef {
                name: request.name.clone(),
                symbol: request.symbol.clone(),
                uri: pinned.metadata_uri.clone(),
            },
            request.buy_amount,
        );
        let builder = LaunchDraftBuilder::new(self.portal.clone(), payload, mint.clone());

        let signature = self
            .submitter
            .submit_traced(&builder, signer, Some(self.config.submit.commitment), trace)
            .await
            .inspect_err(|e| {
                if let Some(signature) = e.ledger_error().and_then(|failure| failure.signature) {
                    warn!(%signature, "Create transaction was sent but not confirmed");
                }
            })?;

        let outcome = LaunchOutcome {
            signature,
            mint: mint.pubkey(),
            metadata_uri: pinned.metadata_uri.clone(),
            pump_url: pump_url(&mint.pubkey()),
        };
        info!(signature = %outcome.signature, pump_url = %outcome.pump_url, "Token launched");

        self.record(request, &creator, &pinned, &outcome).await;
        Ok(outcome)
    }

    async fn load_image(&self, source: &ImageSource) -> Result<Vec<u8>, PumpError> {
        match source {
            ImageSource::None => Ok(Vec::new()),
            ImageSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| PumpError::Image(format!("{}: {}", path.display(), e))),
            ImageSource::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| PumpError::Image(format!("{}: {}", url, e)))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| PumpError::Image(format!("{}: {}", url, e)))?;
                Ok(bytes.to_vec())
            }
        }
    }

    async fn record(
        &self,
        request: &TokenLaunchRequest,
        creator: &Pubkey,
        pinned: &PinnedMetadata,
        outcome: &LaunchOutcome,
    ) {
        let Some(registry) = &self.registry else {
            debug!("No launch registry configured, skipping record");
            return;
        };

        let image_url = match request.image_source() {
            ImageSource::Url(url) => Some(url),
            _ => pinned.image_uri().map(str::to_string),
        };
        let record = LaunchRecord {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            description: Some(request.description.clone()),
            image_url,
            mint: outcome.mint.to_string(),
            pump_url: Some(outcome.pump_url.clone()),
            dev_wallet: Some(creator.to_string()),
            created_at: None,
        };

        if let Err(e) = registry.record_launch(&record).await {
            warn!(mint = %outcome.mint, error = %e, "Token launched but registry write failed");
        }
    }
}
