//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse, StatsResponse,
};
use crate::record_store::RecordStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared record store
    pub store: Arc<RecordStore>,
}

impl AppState {
    /// Creates a new AppState around the given store.
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Opens the LMDB-backed store described by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = RecordStore::open(&config.db_path, config.store_options())?;
        Ok(Self::new(store))
    }
}

/// Handler for `PUT /kv/:namespace/:key`
pub async fn put_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    state
        .store
        .put_with_ttl(&namespace, &key, req.value.as_bytes(), req.ttl_secs())
        .await?;

    Ok(Json(PutResponse::new(namespace, key, req.ttl_secs())))
}

/// Handler for `GET /kv/:namespace/:key`
pub async fn get_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let value = state.store.get(&namespace, &key).await?;

    Ok(Json(GetResponse::new(namespace, key, &value)))
}

/// Handler for `DELETE /kv/:namespace/:key`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.store.delete(&namespace, &key).await?;

    Ok(Json(DeleteResponse::key(namespace, key)))
}

/// Handler for `DELETE /kv/:namespace`
pub async fn delete_namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.store.delete_namespace(&namespace).await?;

    Ok(Json(DeleteResponse::namespace(namespace)))
}

/// Handler for `GET /stats`
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from_stats(state.store.stats().await))
}

/// Handler for `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
