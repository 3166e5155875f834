//! Launchpad CLI
//!
//! Launches tokens through Pump.fun with resilient transaction submission and
//! browses launches recorded in the registry.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use launchpad::backend::{LaunchRecord, LaunchRegistry, RegistryError};
use launchpad::config::{Config, MonitoringConfig, WalletConfig};
use launchpad::metrics::metrics;
use launchpad::Pubkey;
use launchpad::pump::{pump_url, Launcher, TokenInfo, TokenInfoClient, TokenLaunchRequest};
use launchpad::tx_submit::{Commitment, ResilientSubmitter, RpcLedgerClient, TransactionSigner};
use launchpad::wallet::{load_keypair, WalletSigner};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    dump_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a token and submit its create transaction
    Launch(LaunchArgs),
    /// List the most recent launches
    Recent,
    /// List projects for exploration
    Explore,
    /// Show a launched token by mint address
    Info {
        mint: String,
    },
}

#[derive(Args, Debug)]
struct LaunchArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    symbol: String,

    #[arg(long)]
    description: String,

    /// Image URL or local file
    #[arg(long)]
    image: Option<String>,

    #[arg(long)]
    website: Option<String>,

    #[arg(long)]
    twitter: Option<String>,

    #[arg(long)]
    telegram: Option<String>,

    /// Initial dev buy in SOL
    #[arg(long, default_value_t = 0.0)]
    buy_amount: f64,

    /// Confirmation commitment (confirmed or finalized)
    #[arg(long)]
    commitment: Option<Commitment>,

    /// Use this keypair file as the mint instead of a fresh one
    #[arg(long)]
    mint_keypair: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_file_with_env(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if cli.json_logs {
        config.monitoring.json_logs = true;
    }

    init_logging(cli.verbose, &config.monitoring)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting launchpad");

    let result = match cli.command {
        Command::Launch(args) => run_launch(config.clone(), args).await,
        Command::Recent => {
            let registry = LaunchRegistry::new(&config.backend)?;
            print_records(&registry.recent_launches().await?);
            Ok(())
        }
        Command::Explore => {
            let registry = LaunchRegistry::new(&config.backend)?;
            print_records(&registry.explore().await?);
            Ok(())
        }
        Command::Info { mint } => {
            let client = TokenInfoClient::new(&config.pump)?;
            print_token_info(&client.token_info(&mint).await?);
            Ok(())
        }
    };

    if cli.dump_metrics || config.monitoring.dump_metrics {
        println!("{}", metrics().render()?);
    }

    result
}

async fn run_launch(mut config: Config, args: LaunchArgs) -> Result<()> {
    if let Some(commitment) = args.commitment {
        config.submit.commitment = commitment;
    }

    let wallet = load_wallet(&config.wallet)?;
    info!(wallet = %wallet.pubkey(), rpc = %config.rpc.url, "Wallet loaded");

    let ledger = Arc::new(RpcLedgerClient::new(&config.rpc));
    let submitter = ResilientSubmitter::new(ledger)
        .with_send_options(config.submit.send)
        .with_default_commitment(config.submit.commitment);

    let registry = match LaunchRegistry::new(&config.backend) {
        Ok(registry) => Some(registry),
        Err(RegistryError::MissingConfig) => {
            warn!("Launch registry not configured; the launch will not be recorded");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let request = TokenLaunchRequest {
        name: args.name,
        symbol: args.symbol,
        description: args.description,
        creator: wallet.pubkey().to_string(),
        image: args.image,
        website: args.website,
        twitter: args.twitter,
        telegram: args.telegram,
        buy_amount: args.buy_amount,
    };

    let launcher = Launcher::new(config, submitter, registry)?;
    let outcome = match args.mint_keypair {
        Some(path) => {
            let mint = load_keypair(&path).context("Failed to load mint keypair")?;
            launcher.launch_with_mint(&request, &wallet, mint).await?
        }
        None => launcher.launch(&request, &wallet).await?,
    };

    println!("Signature: {}", outcome.signature);
    println!("Mint:      {}", outcome.mint);
    println!("Metadata:  {}", outcome.metadata_uri);
    println!("Pump.fun:  {}", outcome.pump_url);
    Ok(())
}

fn load_wallet(config: &WalletConfig) -> Result<WalletSigner> {
    match &config.secret_key {
        Some(secret) => WalletSigner::from_base58(secret),
        None => WalletSigner::from_file(&config.keypair_path).context("Failed to load wallet"),
    }
}

fn print_records(records: &[LaunchRecord]) {
    if records.is_empty() {
        println!("No launches found");
        return;
    }
    for record in records {
        let created = record
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<10} {:<24} {:<44} {}",
            record.symbol, record.name, record.mint, created
        );
        if let Some(url) = &record.pump_url {
            println!("           {}", url);
        }
    }
}

fn print_token_info(info: &TokenInfo) {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("Name:       {}", text(&info.name));
    println!("Symbol:     {}", text(&info.symbol));
    println!("Mint:       {}", info.mint);
    println!("Creator:    {}", text(&info.creator));
    if let Some(cap) = info.usd_market_cap {
        println!("Market cap: ${:.2}", cap);
    }
    if let Some(complete) = info.complete {
        let stage = if complete { "migrated" } else { "bonding curve" };
        println!("Stage:      {}", stage);
    }
    println!("Metadata:   {}", text(&info.metadata_uri));
    if let Ok(mint) = info.mint.parse::<Pubkey>() {
        println!("Pump.fun:   {}", pump_url(&mint));
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, monitoring: &MonitoringConfig) -> Result<()> {
    let default_filter = if verbose {
        "launchpad=debug,info".to_string()
    } else {
        format!("launchpad={},warn", monitoring.log_level)
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if monitoring.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}
