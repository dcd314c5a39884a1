//! Handlers for the `/records` routes.

use axum::{
    body::Body,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::read_json;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::routing::query::{Lookup, RecordQuery};
use crate::store::{Mutation, Record, RecordPayload};

/// GET /records with optional `?id=` or `?name=`.
pub async fn get_records(
    State(state): State<AppState>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        tracing::warn!(error = %e, "Rejected query string");
        ApiError::InvalidQuery
    })?;

    match query.lookup() {
        Lookup::All => Ok(Json(state.store.list_all()).into_response()),
        Lookup::ById(id) => {
            let record = state.store.find_by_id(&id).ok_or(ApiError::NotFound)?;
            Ok(Json(record).into_response())
        }
        Lookup::ByName(name) => {
            let records = state.store.find_by_name(&name);
            if records.is_empty() {
                return Err(ApiError::NotFound);
            }
            Ok(Json(records).into_response())
        }
    }
}

/// POST /records
pub async fn create_record(
    State(state): State<AppState>,
    body: Body,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let payload: RecordPayload = read_json(body, state.body_limits).await?;
    let fields = payload.validate().map_err(|e| {
        tracing::info!(error = %e, "Rejected new anime");
        ApiError::Validation
    })?;

    let created = settle(&state, state.store.insert(fields)).await?;
    tracing::info!(id = %created.id, name = %created.name, "Created anime");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /records/{id}
pub async fn update_record(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Body,
) -> Result<Json<Record>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::RouteNotFound)?;
    let payload: RecordPayload = read_json(body, state.body_limits).await?;
    let fields = payload.validate().map_err(|e| {
        tracing::info!(id = %id, error = %e, "Rejected anime update");
        ApiError::Validation
    })?;

    let updated = settle(&state, state.store.replace(&id, fields.into())?).await?;
    tracing::info!(id = %updated.id, "Updated anime");
    Ok(Json(updated))
}

/// DELETE /records/{id}
pub async fn delete_record(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Record>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::RouteNotFound)?;
    let deleted = settle(&state, state.store.delete(&id)?).await?;
    tracing::info!(id = %deleted.id, "Deleted anime");
    Ok(Json(deleted))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Wait for durability only when configured to; otherwise let the write run behind the response.
async fn settle<T>(state: &AppState, mutation: Mutation<T>) -> Result<T, ApiError> {
    if state.wait_for_persist {
        mutation.persisted.wait().await.map_err(|e| {
            tracing::error!(error = %e, "Mutation applied in memory but not persisted");
            ApiError::Persistence
        })?;
    }
    Ok(mutation.value)
}
