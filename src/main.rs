//! mjtimeline CLI
//!
//! Command-line interface for timeline operations:
//! - Create a timeline and post to it
//! - Print the reconciled feed
//! - Serve the local REST API

use anyhow::Context;
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mjtimeline::config::{generate_default_config, Config, LoggingConfig};
use mjtimeline::ledger::{RpcLedgerClient, WalletCliSubmitter};
use mjtimeline::{AppState, Post, TimelineService, TimelineStore};

#[derive(Parser)]
#[command(name = "mjtimeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Micro-journalism timeline on an IOTA Move ledger")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the local REST API
    Serve,

    /// Create a new shared timeline and make it current
    CreateTimeline,

    /// Post to the current timeline
    Post {
        /// Post text (3-500 characters)
        content: String,
    },

    /// Print the current timeline's posts, newest first
    Feed {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the current timeline id
    Show,

    /// Forget the current timeline
    Clear,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let (config, config_path) = Config::resolve(cli.config.as_deref())?;
    init_logging(&config.logging);

    match &config_path {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }

    let service = Arc::new(build_service(&config)?);

    match cli.command {
        Commands::Serve => {
            tracing::info!("mjtimeline v{}", env!("CARGO_PKG_VERSION"));
            service.load_persisted().await?;
            let poller = Arc::clone(&service).start_polling();

            let api_config = config.server();
            mjtimeline::serve(AppState::new(service), &api_config).await?;

            if let Some(handle) = poller {
                handle.abort();
            }
        }

        Commands::CreateTimeline => {
            let timeline_id = service.create_timeline().await?;
            println!("Created timeline {}", timeline_id);
        }

        Commands::Post { content } => {
            service.load_persisted().await?;
            let digest = service.create_post(&content).await?;
            println!("Posted ({})", digest);
        }

        Commands::Feed { json } => {
            service.load_persisted().await?;
            let state = service.snapshot().await;

            if let Some(error) = &state.error {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            if state.timeline_id.is_none() {
                eprintln!("No timeline yet. Run `mjtimeline create-timeline` first.");
                std::process::exit(1);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&state.posts)?);
            } else if state.posts.is_empty() {
                println!("No posts yet.");
            } else {
                for post in &state.posts {
                    print_post(post);
                }
            }
        }

        Commands::Show => match service.load_persisted().await? {
            Some(id) => println!("{}", id),
            None => println!("No timeline"),
        },

        Commands::Clear => {
            service.clear_timeline().await?;
            println!("Timeline cleared");
        }

        Commands::Config { .. } => unreachable!("handled before config load"),
    }

    Ok(())
}

fn build_service(config: &Config) -> anyhow::Result<TimelineService> {
    let reader = Arc::new(RpcLedgerClient::new(config.ledger.rpc())?);
    let submitter = Arc::new(WalletCliSubmitter::new(config.ledger.wallet()));
    let store = TimelineStore::new(config.storage.data_path());

    tracing::debug!(
        rpc_url = %config.ledger.rpc_url,
        network = %config.ledger.network,
        store = ?store.path(),
        "Timeline service configured"
    );

    Ok(TimelineService::new(reader, submitter, store, config.service()))
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mjtimeline={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_post(post: &Post) {
    let when = i64::try_from(post.timestamp)
        .ok()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("#{:<4} {}  {}", post.id, post.short_author(), when);
    println!("      {}", post.content);
    println!();
}
