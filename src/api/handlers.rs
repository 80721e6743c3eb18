//! HTTP request handlers and shared application state
//!
//! Each public async function corresponds to an API route registered in
//! [`create_router`](crate::api::create_router). Handlers validate input,
//! delegate to the [`IndexStore`](crate::store::IndexStore), and serialize
//! results; the registry itself is mutated only by the store.

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::error::IndexError;
use crate::store::{CreateOutcome, IndexStore};
use axum::extract::{Path, State};
use axum::Json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state passed to every handler via Axum's `State` extractor
#[derive(Clone)]
pub struct AppState {
    /// The process-wide index registry
    pub store: Arc<IndexStore>,
}

/// `POST /index/:collection`
pub async fn create_index(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<CreateIndexRequest>,
) -> Result<Json<CreateIndexResponse>, ApiError> {
    if collection.trim().is_empty() {
        return Err(IndexError::InvalidInput("collection name is empty".into()).into());
    }

    let start = Instant::now();
    let outcome = state
        .store
        .create(
            &collection,
            &request.chunks,
            request.replace_existing,
            request.durable,
        )
        .await?;
    let processing_time_seconds = start.elapsed().as_secs_f64();

    let response = match outcome {
        CreateOutcome::Indexed {
            chunk_count,
            created_at,
            index_size_bytes,
            persisted,
        } => CreateIndexResponse {
            status: "indexed".to_string(),
            collection,
            chunks: chunk_count,
            processing_time_seconds,
            index_size_bytes: Some(index_size_bytes),
            created_at: Some(created_at),
            persisted,
        },
        CreateOutcome::Exists { chunk_count } => CreateIndexResponse {
            status: "exists".to_string(),
            collection,
            chunks: chunk_count,
            processing_time_seconds,
            index_size_bytes: None,
            created_at: None,
            persisted: false,
        },
    };

    Ok(Json(response))
}

/// `POST /search/:collection`
pub async fn search_index(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(IndexError::InvalidInput("query is empty".into()).into());
    }
    if request.top_k == 0 {
        return Err(IndexError::InvalidInput("top_k must be greater than 0".into()).into());
    }

    let deadline = request
        .timeout_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let results = state
        .store
        .search(&collection, &request.query, request.top_k, deadline)
        .await?;

    Ok(Json(SearchResponse {
        collection,
        total_results: results.len(),
        query: request.query,
        results,
    }))
}

/// `DELETE /index/:collection`
pub async fn delete_index(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<DeleteIndexResponse>, ApiError> {
    state.store.delete(&collection).await?;

    Ok(Json(DeleteIndexResponse {
        status: "deleted".to_string(),
        collection,
    }))
}

/// `GET /stats`
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.store.stats().await;

    let indices: HashMap<String, StatsEntry> = stats
        .into_iter()
        .map(|(name, s)| {
            (
                name,
                StatsEntry {
                    chunk_count: s.chunk_count,
                    created_at: s.created_at,
                    corpus_size: s.corpus_size,
                },
            )
        })
        .collect();

    Json(StatsResponse {
        total_indices: indices.len(),
        indices,
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
