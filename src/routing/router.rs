//! Route table for the record API.

use axum::{
    routing::{get, put},
    Router,
};

use crate::http::server::AppState;
use crate::routing::handlers::{
    create_record, delete_record, get_records, method_not_allowed, route_not_found,
    update_record,
};

/// Build the `/records` routes with JSON 404/405 fallbacks.
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/records",
            get(get_records)
                .post(create_record)
                .fallback(method_not_allowed),
        )
        .route(
            "/records/{id}",
            put(update_record)
                .delete(delete_record)
                .fallback(method_not_allowed),
        )
        .fallback(route_not_found)
}
