//! Metrics collection and exposition.
//!
//! # Metrics
//! - `records_http_requests_total` (counter): requests by method, route, status
//! - `records_http_request_duration_seconds` (histogram): latency by method, route
//! - `records_persist_total` (counter): backing-file writes by outcome
//! - `records_persist_duration_seconds` (histogram): write latency
//! - `records_collection_size` (gauge): records currently held

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "records_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "records_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_persist(outcome: &'static str, start: Instant) {
    metrics::counter!("records_persist_total", "outcome" => outcome).increment(1);
    metrics::histogram!("records_persist_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_collection_size(size: usize) {
    metrics::gauge!("records_collection_size").set(size as f64);
}

/// Middleware recording one counter and one latency sample per request.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
