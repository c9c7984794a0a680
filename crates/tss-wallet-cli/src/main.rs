//! TSS Wallet CLI
//!
//! Command-line tool for inspecting and clearing locally cached wallet
//! sessions. Share material is never printed.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use tss_wallet_core::{
    CacheKey, FileSystemWalletCache, WalletCache,
    config::{DEFAULT_NAMESPACE, validate_namespace},
    storage::RecordSummary,
};

#[derive(Parser)]
#[command(name = "tss-wallet")]
#[command(about = "TSS wallet session cache tool", version)]
struct Cli {
    /// Directory holding the wallet cache
    #[arg(long, env = "TSS_WALLET_CACHE_DIR", default_value = ".tss-wallet")]
    cache_dir: PathBuf,

    /// Cache namespace
    #[arg(long, env = "TSS_WALLET_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tool and cache configuration
    Info,

    /// List users with a cached wallet
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the cached wallet for a user
    Show {
        /// User id as returned by the engine
        user_id: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove the cached wallet for a user
    ///
    /// The next session for this user will run DKG or device registration.
    Clear {
        /// User id as returned by the engine
        user_id: String,
    },

    /// Remove temporary files left behind by interrupted writes
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    validate_namespace(&cli.namespace)?;

    match &cli.command {
        Commands::Info => {
            show_info(&cli);
        }
        Commands::List { format } => {
            let cache = open_cache(&cli)?;
            list_wallets(&cache, &cli.namespace, format).await?;
        }
        Commands::Show { user_id, format } => {
            let cache = open_cache(&cli)?;
            let key = CacheKey::new(&cli.namespace, user_id);
            show_wallet(&cache, &key, format).await?;
        }
        Commands::Clear { user_id } => {
            let cache = open_cache(&cli)?;
            let key = CacheKey::new(&cli.namespace, user_id);
            clear_wallet(&cache, &key).await?;
        }
        Commands::Purge => {
            let cache = open_cache(&cli)?;
            let removed = cache.purge_temp_files(&cli.namespace).await?;
            info!(namespace = %cli.namespace, removed, "Purged temporary files");
            println!("Removed {} temporary file(s)", removed);
        }
    }

    Ok(())
}

fn open_cache(cli: &Cli) -> Result<FileSystemWalletCache> {
    FileSystemWalletCache::new(&cli.cache_dir)
        .with_context(|| format!("opening cache at {}", cli.cache_dir.display()))
}

fn check_format(format: &str) -> Result<()> {
    if !matches!(format, "text" | "json") {
        bail!("unsupported format {}, expected text or json", format);
    }
    Ok(())
}

fn show_info(cli: &Cli) {
    println!("TSS Wallet v{}", tss_wallet_core::VERSION);
    println!();
    println!("Cache:");
    println!("  Directory: {}", cli.cache_dir.display());
    println!("  Namespace: {}", cli.namespace);
    println!();
    println!("Session resolution:");
    println!("  1. Cached record for the user");
    println!("  2. Distributed key generation");
    println!("  3. Device registration when the wallet exists server-side");
}

async fn list_wallets(cache: &FileSystemWalletCache, namespace: &str, format: &str) -> Result<()> {
    check_format(format)?;

    let mut summaries = Vec::new();
    for user_id in cache.list(namespace).await? {
        let key = CacheKey::new(namespace, user_id);
        if let Some(summary) = cache.describe(&key).await? {
            summaries.push(summary);
        }
    }

    if format == "json" {
        let output: Vec<_> = summaries.iter().map(summary_json).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No cached wallets in namespace {}", namespace);
        return Ok(());
    }

    println!("Cached wallets ({}):", summaries.len());
    for summary in &summaries {
        println!(
            "  - {}: {}{}",
            summary.user_id,
            summary.address.as_deref().unwrap_or("<no address>"),
            if summary.is_complete() { "" } else { " [INCOMPLETE]" }
        );
    }

    Ok(())
}

async fn show_wallet(cache: &FileSystemWalletCache, key: &CacheKey, format: &str) -> Result<()> {
    check_format(format)?;

    let Some(summary) = cache.describe(key).await? else {
        bail!("no cached wallet for {}", key);
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
        return Ok(());
    }

    println!("User: {}", summary.user_id);
    println!(
        "Address: {}",
        summary.address.as_deref().unwrap_or("<missing>")
    );
    println!(
        "Metadata: {}",
        summary
            .metadata
            .as_ref()
            .map(|m| m.as_str())
            .unwrap_or("<missing>")
    );
    println!(
        "Share material: {}",
        if summary.has_share_material { "present" } else { "missing" }
    );
    println!("Stored at: {}", summary.stored_at.to_rfc3339());

    if !summary.is_complete() {
        println!("\n[WARNING] Record is incomplete and will be ignored by new sessions");
    }

    Ok(())
}

async fn clear_wallet(cache: &FileSystemWalletCache, key: &CacheKey) -> Result<()> {
    if cache.remove(key).await? {
        info!(key = %key, "Removed cached wallet");
        println!("Removed cached wallet for {}", key.user_id);
    } else {
        println!("No cached wallet for {}", key.user_id);
    }
    Ok(())
}

fn summary_json(summary: &RecordSummary) -> serde_json::Value {
    serde_json::json!({
        "user_id": summary.user_id,
        "address": summary.address,
        "metadata": summary.metadata.as_ref().map(|m| m.as_str()),
        "has_share_material": summary.has_share_material,
        "complete": summary.is_complete(),
        "stored_at": summary.stored_at.to_rfc3339(),
    })
}
