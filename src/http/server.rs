//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the record routes
//! - Wire up middleware (request ID, tracing, timeout, CORS, metrics)
//! - Serve on a listener until shutdown, then flush the store

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::request::BodyLimits;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::routing::record_routes;
use crate::security::headers::with_cors_headers;
use crate::store::RecordStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub body_limits: BodyLimits,
    pub wait_for_persist: bool,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>, config: &ServiceConfig) -> Self {
        Self {
            store,
            body_limits: BodyLimits {
                max_bytes: config.security.max_body_size,
                read_timeout: config.timeouts.body_read(),
            },
            wait_for_persist: config.storage.wait_for_persist,
        }
    }
}

/// HTTP server for the record API.
pub struct HttpServer {
    router: Router,
    store: Arc<RecordStore>,
}

impl HttpServer {
    /// Create a new HTTP server over `store` with the given configuration.
    pub fn new(config: &ServiceConfig, store: Arc<RecordStore>) -> Self {
        let state = AppState::new(store.clone(), config);
        let router = build_router(config, state);
        Self { router, store }
    }

    /// Run the server until `shutdown` fires, then drain and flush the store.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            records = self.store.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");

        match self.store.flush().await {
            Ok(()) => tracing::info!(
                path = %self.store.path().display(),
                records = self.store.len(),
                "Anime data flushed"
            ),
            Err(e) => tracing::error!(error = %e, "Final flush of anime data failed"),
        }
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let app = record_routes()
        .with_state(state)
        .layer(TimeoutLayer::new(config.timeouts.request()))
        .layer(middleware::from_fn(timeout_as_json))
        .layer(middleware::from_fn(metrics::track_requests));

    with_cors_headers(app)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// `TimeoutLayer` answers with a bare 408; give it the same JSON shape as every other error.
async fn timeout_as_json(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        tracing::warn!("Request exceeded the request deadline");
        return ApiError::RequestTimeout.into_response();
    }
    response
}
