//! Request and response data transfer objects for the REST API
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling
//! via Axum.

use crate::chunk::Chunk;
use crate::store::SearchHit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_replace_existing() -> bool {
    true
}

fn default_top_k() -> usize {
    10
}

/// Request body for `POST /index/:collection`
#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    /// Chunks to index, in order
    pub chunks: Vec<Chunk>,
    /// Replace an existing index instead of returning `exists`
    #[serde(default = "default_replace_existing")]
    pub replace_existing: bool,
    /// Fail the request if the durable write fails
    #[serde(default)]
    pub durable: bool,
}

/// Response body for `POST /index/:collection`
#[derive(Debug, Serialize)]
pub struct CreateIndexResponse {
    /// `indexed` or `exists`
    pub status: String,
    /// Collection name
    pub collection: String,
    /// Number of chunks in the index
    pub chunks: usize,
    /// Wall-clock build time in seconds
    pub processing_time_seconds: f64,
    /// Serialized index size estimate in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size_bytes: Option<usize>,
    /// Index creation timestamp (RFC3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Whether the durable write succeeded
    pub persisted: bool,
}

/// Request body for `POST /search/:collection`
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Query string
    pub query: String,
    /// Number of results to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Optional deadline for the search, in milliseconds from receipt
    pub timeout_ms: Option<u64>,
}

/// Response body for `POST /search/:collection`
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Collection name
    pub collection: String,
    /// Echoed query
    pub query: String,
    /// Ranked results
    pub results: Vec<SearchHit>,
    /// Number of results returned
    pub total_results: usize,
}

/// Response body for `DELETE /index/:collection`
#[derive(Debug, Serialize)]
pub struct DeleteIndexResponse {
    /// Always `deleted`
    pub status: String,
    /// Collection name
    pub collection: String,
}

/// Per-collection entry in the stats response
#[derive(Debug, Serialize)]
pub struct StatsEntry {
    /// Number of indexed chunks
    pub chunk_count: usize,
    /// Index creation timestamp (RFC3339)
    pub created_at: String,
    /// Number of documents in the corpus
    pub corpus_size: usize,
}

/// Response body for `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of in-memory indices
    pub total_indices: usize,
    /// Stats per collection
    pub indices: HashMap<String, StatsEntry>,
}

/// Response body for `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Liveness indicator, always `healthy` when reachable
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp (RFC3339)
    pub timestamp: String,
}
