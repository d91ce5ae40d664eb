//! Import worker process.
//!
//! Reads JSON-line commands on stdin and writes JSON-line events on stdout.
//! Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creation_import_core::protocol::write_line;
use creation_import_core::{
    load_config, load_config_from_env, validate_config, Config, EventSender, ImportOrchestrator,
    ImportSession,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file used when `CREATION_IMPORT_CONFIG` is not set
const DEFAULT_CONFIG_PATH: &str = "creation-import.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    info!("Starting creation-import-worker v{}", VERSION);

    let config = load_worker_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    let (events, mut rx) = EventSender::channel(config.import.event_buffer);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = rx.recv().await {
            if let Err(e) = write_line(&mut stdout, &event).await {
                error!("Failed to write event: {}", e);
                break;
            }
        }
    });

    let orchestrator = Arc::new(ImportOrchestrator::from_config(&config));
    let session = ImportSession::new(orchestrator, events);
    session
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .context("Failed to read commands")?;

    // Closing the last sender lets the writer drain and stop
    drop(session);
    writer.await.context("Event writer task failed")?;

    info!("Worker finished");
    Ok(())
}

fn load_worker_config() -> Result<Config> {
    let path = match std::env::var("CREATION_IMPORT_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default_path.exists() {
                info!("No configuration file, using defaults");
                return load_config_from_env().context("Failed to load config from environment");
            }
            default_path
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}
