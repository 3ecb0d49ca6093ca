//! Embedding cache CLI
//!
//! Administration surface for the cache: embed a text or file, report
//! statistics, clear the store, remove stale entries, list the oldest
//! entries. All subcommands are direct pass-throughs to the cache
//! service.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::sync::Arc;

use ai_core::create_engine;
use application::EmbeddingCacheService;
use chrono::Duration;
use clap::{Parser, Subcommand};
use domain::ModelId;
use infrastructure::{AppConfig, EngineProviderAdapter, SqliteEmbeddingStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Embedding cache CLI
#[derive(Parser)]
#[command(name = "embedcache")]
#[command(version, about = "Persistent embedding cache CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file basename (without extension)
    #[arg(long, default_value = "config")]
    config: String,

    /// Override the database path from the config
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a text (or a file's contents) through the cache
    Embed {
        /// Text to embed
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Model to embed with (defaults to the provider's default)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show cache statistics
    Stats,

    /// Remove all cached entries (statistics are kept)
    Clear,

    /// Remove entries not accessed within the given number of days
    Cleanup {
        /// Age threshold in days (defaults to the configured value)
        #[arg(long)]
        days: Option<u64>,
    },

    /// List the oldest cached entries
    List {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check whether the embedding provider is reachable
    Health,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(cli.verbose))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load_from(Some(&cli.config))?;
    if let Some(db) = cli.db {
        config.database.path = db.to_string_lossy().into_owned();
    }

    let engine = create_engine(&config.provider)?;
    let adapter = Arc::new(EngineProviderAdapter::new(Arc::clone(&engine)));
    let store = Arc::new(SqliteEmbeddingStore::open(&config.database)?);
    let service = EmbeddingCacheService::new(store, Arc::clone(&adapter));

    match cli.command {
        Commands::Embed { text, file, model } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => anyhow::bail!("either TEXT or --file is required"),
            };

            let model = match model {
                Some(name) => ModelId::parse(&name)?,
                None => adapter.default_model().clone(),
            };

            let vector = service.get_or_compute(&text, &model).await?;
            println!("Embedded under model {model} ({} dimensions)", vector.len());

            let report = service.stats().await?;
            println!(
                "Cache: {} entries, {} requests, hit rate {:.1}%",
                report.entry_count,
                report.total_requests,
                report.hit_rate * 100.0
            );
        },

        Commands::Stats => {
            let report = service.stats().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        },

        Commands::Clear => {
            let removed = service.clear_cache().await?;
            println!("Removed {removed} cached entries (statistics kept)");
        },

        Commands::Cleanup { days } => {
            let days = days.unwrap_or(config.cache.cleanup_max_age_days);
            #[allow(clippy::cast_possible_wrap)]
            let removed = service.cleanup(Duration::days(days as i64)).await?;
            println!("Removed {removed} entries not accessed in the last {days} days");
        },

        Commands::List { limit } => {
            let limit = limit.unwrap_or(config.cache.list_limit);
            let entries = service.list_oldest(limit).await?;
            if entries.is_empty() {
                println!("Cache is empty");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{}. {} {} created {} last accessed {} ({} accesses)",
                    i + 1,
                    entry.key.model,
                    &entry.key.content.as_str()[..12],
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.last_accessed_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.access_count
                );
            }
        },

        Commands::Health => {
            let healthy = engine.health_check().await?;
            if healthy {
                println!("Embedding provider is reachable");
            } else {
                println!("Embedding provider is NOT reachable");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
