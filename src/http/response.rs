//! Error responses.
//!
//! Every failure leaves the service as `{"error": "<message>"}` with
//! `Content-Type: application/json`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Request-level failures and their status codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Incomplete data. Please provide all required fields.")]
    Validation,

    #[error("Malformed JSON body.")]
    MalformedBody,

    #[error("Invalid field types. Expected strings for name, genre and author and an integer year.")]
    InvalidFieldTypes,

    #[error("Invalid query string.")]
    InvalidQuery,

    #[error("Anime not found.")]
    NotFound,

    #[error("Route not found.")]
    RouteNotFound,

    #[error("Method not allowed.")]
    MethodNotAllowed,

    #[error("Timed out reading request body.")]
    BodyTimeout,

    #[error("Request timed out.")]
    RequestTimeout,

    #[error("Request body too large.")]
    PayloadTooLarge,

    #[error("Failed to persist anime data.")]
    Persistence,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation
            | ApiError::MalformedBody
            | ApiError::InvalidFieldTypes
            | ApiError::InvalidQuery => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BodyTimeout | ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
        }
    }
}

/// Wire shape of every error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
