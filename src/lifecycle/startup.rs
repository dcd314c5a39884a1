//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the record store (tolerating a missing or broken backing file)
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::store::RecordStore;

/// Fatal startup or serve failure.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Boot every subsystem in order and serve until `shutdown` fires.
pub async fn start(
    config: ServiceConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let store = Arc::new(RecordStore::open(config.storage.data_file.clone()).await);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    tracing::info!(
        address = %listener.local_addr()?,
        data_file = %config.storage.data_file.display(),
        "Listening for connections"
    );

    HttpServer::new(&config, store).run(listener, shutdown).await?;
    Ok(())
}
