//! Request body handling.
//!
//! # Responsibilities
//! - Buffer the full body under a size limit and a deadline
//! - Parse it as JSON, separating syntax errors from shape errors
//!
//! # Design Decisions
//! - A body that never finishes arriving is cut off with 408 instead of holding the connection
//! - Oversized bodies are rejected with 413 before any parsing

use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use serde::de::DeserializeOwned;

use crate::http::response::ApiError;

/// Limits applied while buffering a request body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
    pub read_timeout: Duration,
}

/// Collect the whole body, bounded in size and time.
pub async fn read_body(body: Body, limits: BodyLimits) -> Result<Bytes, ApiError> {
    match tokio::time::timeout(limits.read_timeout, to_bytes(body, limits.max_bytes)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, max_bytes = limits.max_bytes, "Rejected request body");
            Err(ApiError::PayloadTooLarge)
        }
        Err(_) => {
            tracing::warn!(timeout = ?limits.read_timeout, "Request body did not arrive in time");
            Err(ApiError::BodyTimeout)
        }
    }
}

/// Read and decode a JSON body into `T`.
///
/// Invalid JSON is [`ApiError::MalformedBody`]; valid JSON of the wrong shape
/// (wrong field types, not an object) is [`ApiError::InvalidFieldTypes`].
pub async fn read_json<T: DeserializeOwned>(body: Body, limits: BodyLimits) -> Result<T, ApiError> {
    let bytes = read_body(body, limits).await?;

    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!(error = %e, "Malformed JSON body");
        ApiError::MalformedBody
    })?;

    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(error = %e, "Request body has the wrong shape");
        ApiError::InvalidFieldTypes
    })
}
