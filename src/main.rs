//! Anime record service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ routing ──▶ store::RecordStore ──▶ in-memory collection
//!                        (request id,     (route      (find / insert /          │
//!                         trace, CORS,     table)      replace / delete)        ▼
//!                         timeout)                                        store::persist
//!     Client Response                                                     (single writer)
//!     ◀─────────────── JSON body ◀─────── ApiError / Record                     │
//!                                                                               ▼
//!                                                                         anime.json
//! ```

use std::path::PathBuf;

use clap::Parser;

use anime_records::config::{self, loader::read_config, ServiceConfig};
use anime_records::lifecycle::{self, signals, Shutdown};
use anime_records::observability::logging;

#[derive(Parser)]
#[command(name = "anime-records")]
#[command(about = "HTTP CRUD service for anime records backed by a JSON file", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the backing JSON file.
    #[arg(long)]
    data_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(data_file) = cli.data_file {
        config.storage.data_file = data_file;
    }
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init(&config.observability);

    tracing::info!("anime-records v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_file = %config.storage.data_file.display(),
        wait_for_persist = config.storage.wait_for_persist,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    lifecycle::start(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
