use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Collection, ItemIdentity, LibraryRecord, MarkResponse, MediaKind, RemoveResponse},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn list(
    state: &AppState,
    collection: Collection,
    kind: MediaKind,
) -> AppResult<Json<Vec<LibraryRecord>>> {
    let records = state.repository.list(collection, kind).await?;
    Ok(Json(records))
}

/// `GET {collection}/movies`
pub async fn list_movies(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
) -> AppResult<Json<Vec<LibraryRecord>>> {
    list(&state, collection, MediaKind::Movie).await
}

/// `GET {collection}/series`
pub async fn list_series(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
) -> AppResult<Json<Vec<LibraryRecord>>> {
    list(&state, collection, MediaKind::Series).await
}

/// `POST {collection}`; adding an item twice returns the stored row
pub async fn add_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Extension(request_id): Extension<RequestId>,
    Json(record): Json<LibraryRecord>,
) -> AppResult<Json<MarkResponse>> {
    let stored = state.repository.add(collection, record).await?;

    tracing::info!(
        request_id = %request_id,
        collection = %collection,
        identity = %stored.identity(),
        "Library item added"
    );

    Ok(Json(MarkResponse {
        tmdb_id: stored.tmdb_id,
        kind: stored.kind,
    }))
}

/// `DELETE {collection}/{kind}/{tmdb_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Extension(request_id): Extension<RequestId>,
    Path((kind, tmdb_id)): Path<(MediaKind, i64)>,
) -> AppResult<Json<RemoveResponse>> {
    let identity = ItemIdentity::new(kind, tmdb_id);

    if !state.repository.remove(collection, identity).await? {
        return Err(AppError::NotFound(collection.missing_detail().to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        collection = %collection,
        identity = %identity,
        "Library item removed"
    );

    Ok(Json(RemoveResponse { removed: true }))
}
