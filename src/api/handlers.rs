//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{CacheStore, EventKind, Snapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, LoadResponse, PurgeResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The store itself is single-threaded; the lock serializes every call.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore<Value>>>,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore<Value>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Applies the default TTL and, when enabled, registers a listener per
    /// event kind that logs each event.
    pub fn from_config(config: &Config) -> Self {
        let cache: CacheStore<Value> = CacheStore::new().with_default_ttl(config.default_ttl_ms);

        if config.log_events {
            for kind in EventKind::ALL {
                cache.add_listener(kind, |event| {
                    info!(
                        event = %event.event_name,
                        key = event.data.key,
                        entries = event.data.store.len(),
                        "cache event"
                    );
                    Ok(())
                });
            }
        }

        Self::new(cache)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(req.key.clone(), req.value, req.ttl)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key. Absent and expired keys are 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: reads update stats and dispatch listeners
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key)?
        .cloned()
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Removes a key from the cache. Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    let removed = cache.remove(&key)?.is_some();

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for GET /snapshot
///
/// Returns a copy of every entry, expired ones included.
pub async fn snapshot_handler(State(state): State<AppState>) -> Json<Snapshot<Value>> {
    let cache = state.cache.read().await;
    Json(cache.snapshot())
}

/// Handler for PUT /snapshot
///
/// Replaces the whole store with the posted snapshot.
pub async fn load_handler(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot<Value>>,
) -> Json<LoadResponse> {
    let mut cache = state.cache.write().await;
    cache.load(snapshot);

    Json(LoadResponse {
        loaded: cache.len(),
    })
}

/// Handler for POST /purge
///
/// Sweeps expired entries out of the store.
pub async fn purge_handler(State(state): State<AppState>) -> Json<PurgeResponse> {
    let mut cache = state.cache.write().await;
    let purged = cache.purge_expired();

    Json(PurgeResponse { purged })
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
