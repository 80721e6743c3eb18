//! Index metadata
//!
//! Descriptive metadata co-owned with a BM25 artifact: the two are always
//! created, persisted, and loaded together. Document index `i` in the
//! artifact corresponds to `chunk_ids[i]` and `chunk_metadata[i]` here.

use crate::chunk::Chunk;
use crate::index::Bm25Artifact;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current metadata schema version
pub const METADATA_SCHEMA_VERSION: &str = "1.0";

/// Per-collection index metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Collection name this metadata belongs to
    pub collection: String,
    /// Number of indexed chunks
    pub chunk_count: usize,
    /// Chunk ids in index order
    pub chunk_ids: Vec<String>,
    /// Opaque chunk metadata, aligned positionally with `chunk_ids`
    pub chunk_metadata: Vec<Value>,
    /// Index creation timestamp (RFC3339)
    pub created_at: String,
    /// Number of documents in the corpus
    pub corpus_size: usize,
    /// Schema version for compatibility checking
    #[serde(default)]
    pub schema_version: String,
}

impl IndexMetadata {
    /// Create metadata from the chunks an index was built from
    pub fn new(collection: &str, chunks: &[Chunk]) -> Self {
        Self {
            collection: collection.to_string(),
            chunk_count: chunks.len(),
            chunk_ids: chunks.iter().map(|c| c.id.clone()).collect(),
            chunk_metadata: chunks.iter().map(|c| c.metadata.clone()).collect(),
            created_at: chrono::Utc::now().to_rfc3339(),
            corpus_size: chunks.len(),
            schema_version: METADATA_SCHEMA_VERSION.to_string(),
        }
    }

    /// Check internal alignment and agreement with an artifact
    ///
    /// Loading a metadata/artifact pair that fails this check is an
    /// inconsistent state and must be treated as "index absent".
    pub fn is_consistent_with(&self, artifact: &Bm25Artifact) -> bool {
        self.chunk_ids.len() == self.chunk_count
            && self.chunk_metadata.len() == self.chunk_count
            && self.corpus_size == self.chunk_count
            && artifact.num_docs() == self.corpus_size
    }
}
