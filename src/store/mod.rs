//! Index store
//!
//! The process-wide registry mapping collection name to its in-memory
//! index. Owns the create/search/delete/stats lifecycle, lazy-loads from
//! storage on cache miss, and is the single point of concurrency control:
//! the API layer never touches the registry directly.
//!
//! Locking discipline: an outer map lock guards only slot lookup/insertion
//! and is never held across a slot acquisition. Each collection has its own
//! slot lock: searches share it as readers against an immutable entry,
//! while create and delete take it as writers, excluding operations on that
//! collection only. Operations on different collections never block each
//! other.

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};
use crate::index::{build_index, Bm25Artifact, Bm25Params, IndexMetadata};
use crate::storage::IndexStorage;
use crate::tokenizer;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// One resident collection: artifact and metadata from the same build
#[derive(Debug)]
pub struct CollectionEntry {
    /// Trained scoring structure
    pub artifact: Bm25Artifact,
    /// Aligned descriptive metadata
    pub metadata: IndexMetadata,
}

/// Per-collection slot; `None` means absent in memory
type Slot = Option<Arc<CollectionEntry>>;

/// Outcome of a create call
#[derive(Debug)]
pub enum CreateOutcome {
    /// A new index was built and swapped in
    Indexed {
        /// Number of chunks indexed
        chunk_count: usize,
        /// Creation timestamp of the new index (RFC3339)
        created_at: String,
        /// Serialized artifact size estimate in bytes
        index_size_bytes: usize,
        /// Whether the durable write succeeded
        persisted: bool,
    },
    /// The collection already existed and `replace_existing` was false
    Exists {
        /// Chunk count of the untouched existing index
        chunk_count: usize,
    },
}

/// One ranked search hit, mapped back to its chunk
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// 1-based rank
    pub rank: usize,
    /// Chunk id from the collection metadata
    pub chunk_id: String,
    /// BM25 relevance score
    pub score: f32,
    /// Opaque chunk metadata, returned untouched
    pub metadata: Value,
}

/// Read-only stats snapshot for one collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    /// Number of indexed chunks
    pub chunk_count: usize,
    /// Index creation timestamp (RFC3339)
    pub created_at: String,
    /// Number of documents in the corpus
    pub corpus_size: usize,
}

/// Process-wide registry of BM25 indices
pub struct IndexStore {
    storage: IndexStorage,
    params: Bm25Params,
    collections: RwLock<HashMap<String, Arc<RwLock<Slot>>>>,
}

impl IndexStore {
    /// Create a store over a storage directory
    pub fn new(storage: IndexStorage, params: Bm25Params) -> Self {
        Self {
            storage,
            params,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Get or insert the slot for a collection
    ///
    /// The outer lock is released before the caller touches the slot lock,
    /// so slow operations on one collection never hold up the registry.
    async fn slot(&self, collection: &str) -> Arc<RwLock<Slot>> {
        {
            let map = self.collections.read().await;
            if let Some(slot) = map.get(collection) {
                return Arc::clone(slot);
            }
        }
        let mut map = self.collections.write().await;
        Arc::clone(
            map.entry(collection.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(None))),
        )
    }

    /// Build (or rebuild) the index for a collection
    ///
    /// Holds the collection's write lock for the whole build, so no reader
    /// ever observes a half-built artifact. A failed build leaves the
    /// previous entry untouched. Save failures are non-fatal unless
    /// `durable` is set: the in-memory index stands and the outcome reports
    /// `persisted: false`.
    pub async fn create(
        &self,
        collection: &str,
        chunks: &[Chunk],
        replace_existing: bool,
        durable: bool,
    ) -> Result<CreateOutcome> {
        let slot = self.slot(collection).await;
        let mut guard = slot.write().await;

        if !replace_existing {
            // An index that exists only on disk still counts as existing.
            if guard.is_none() {
                if let Some((artifact, metadata)) = self.load_from_disk(collection)? {
                    *guard = Some(Arc::new(CollectionEntry { artifact, metadata }));
                }
            }
            if let Some(entry) = guard.as_ref() {
                tracing::info!(
                    "Index for '{}' already exists and replace_existing=false",
                    collection
                );
                return Ok(CreateOutcome::Exists {
                    chunk_count: entry.metadata.chunk_count,
                });
            }
        }

        tracing::info!(
            "Creating BM25 index for '{}' with {} chunks",
            collection,
            chunks.len()
        );

        let (artifact, metadata) = build_index(chunks, collection, self.params)?;

        let index_size_bytes = serde_json::to_vec(&artifact)
            .map(|v| v.len())
            .unwrap_or(0);
        let created_at = metadata.created_at.clone();
        let chunk_count = metadata.chunk_count;

        let persisted = match self.storage.save(collection, &artifact, &metadata) {
            Ok(()) => true,
            Err(e) if durable => {
                // Durability was requested; the previous entry stays in place.
                return Err(IndexError::Persistence {
                    collection: collection.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!("Failed to save index for '{}' to disk: {:#}", collection, e);
                false
            }
        };

        // Swap in the fully constructed pair; the old entry is dropped only now.
        *guard = Some(Arc::new(CollectionEntry { artifact, metadata }));

        Ok(CreateOutcome::Indexed {
            chunk_count,
            created_at,
            index_size_bytes,
            persisted,
        })
    }

    /// Search a collection, mapping doc indices back to chunk ids
    ///
    /// Lazy-loads from storage on memory miss. The deadline, if given, is
    /// checked after the read lock is acquired and before scoring begins;
    /// scoring itself is bounded and never cancelled mid-flight.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<SearchHit>> {
        let entry = self.resolve_entry(collection).await?;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(IndexError::DeadlineExceeded(collection.to_string()));
        }

        let query_tokens = tokenizer::tokenize(query);
        let ranked = entry.artifact.retrieve(&query_tokens, top_k);

        let metadata = &entry.metadata;
        let hits = ranked
            .into_iter()
            // Rank positions are valid only inside the corpus; anything
            // else is dropped, never surfaced.
            .filter(|(doc_idx, _)| *doc_idx < metadata.chunk_ids.len())
            .enumerate()
            .map(|(i, (doc_idx, score))| SearchHit {
                rank: i + 1,
                chunk_id: metadata.chunk_ids[doc_idx].clone(),
                score,
                metadata: metadata.chunk_metadata[doc_idx].clone(),
            })
            .collect();

        Ok(hits)
    }

    /// Fetch the resident entry for a collection, loading from disk on miss
    async fn resolve_entry(&self, collection: &str) -> Result<Arc<CollectionEntry>> {
        let slot = self.slot(collection).await;

        {
            let guard = slot.read().await;
            if let Some(entry) = guard.as_ref() {
                return Ok(Arc::clone(entry));
            }
        }

        // Memory miss: take the write lock and try the persistence layer.
        let mut guard = slot.write().await;
        if let Some(entry) = guard.as_ref() {
            // Another task loaded it while we waited.
            return Ok(Arc::clone(entry));
        }
        match self.load_from_disk(collection)? {
            Some((artifact, metadata)) => {
                let entry = Arc::new(CollectionEntry { artifact, metadata });
                *guard = Some(Arc::clone(&entry));
                Ok(entry)
            }
            None => Err(IndexError::NotFound(collection.to_string())),
        }
    }

    fn load_from_disk(&self, collection: &str) -> Result<Option<(Bm25Artifact, IndexMetadata)>> {
        self.storage
            .load(collection)
            .map_err(|e| IndexError::Persistence {
                collection: collection.to_string(),
                source: e,
            })
    }

    /// Delete a collection from memory and durable storage
    ///
    /// Idempotent: deleting a collection that never existed succeeds.
    pub async fn delete(&self, collection: &str) -> Result<()> {
        let slot = self.slot(collection).await;
        let mut guard = slot.write().await;

        *guard = None;
        self.storage
            .remove(collection)
            .map_err(|e| IndexError::Persistence {
                collection: collection.to_string(),
                source: e,
            })?;

        tracing::info!("Deleted index for '{}'", collection);
        Ok(())
    }

    /// Snapshot of every fully built in-memory collection
    ///
    /// Collections mid-build (slot held by a writer) are skipped rather
    /// than awaited, so stats never blocks on a build.
    pub async fn stats(&self) -> HashMap<String, CollectionStats> {
        let slots: Vec<(String, Arc<RwLock<Slot>>)> = {
            let map = self.collections.read().await;
            map.iter()
                .map(|(name, slot)| (name.clone(), Arc::clone(slot)))
                .collect()
        };

        let mut stats = HashMap::new();
        for (name, slot) in slots {
            if let Ok(guard) = slot.try_read() {
                if let Some(entry) = guard.as_ref() {
                    stats.insert(
                        name,
                        CollectionStats {
                            chunk_count: entry.metadata.chunk_count,
                            created_at: entry.metadata.created_at.clone(),
                            corpus_size: entry.metadata.corpus_size,
                        },
                    );
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("c1", "the cat sat"),
            Chunk::new("c2", "the dog ran"),
            Chunk::new("c3", "cats and dogs"),
        ]
    }

    fn test_store(dir: &tempfile::TempDir) -> IndexStore {
        IndexStore::new(
            IndexStorage::new(dir.path()).unwrap(),
            Bm25Params::default(),
        )
    }

    #[tokio::test]
    async fn test_create_then_search_ranks_exact_match_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();
        let hits = store.search("pets", "cat", 1, None).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].chunk_id, "c1");
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_search_unknown_collection_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let err = store.search("ghost", "cat", 10, None).await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_empty_collection_searches_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let outcome = store.create("empty", &[], true, false).await.unwrap();
        assert!(matches!(
            outcome,
            CreateOutcome::Indexed { chunk_count: 0, .. }
        ));

        let hits = store.search("empty", "anything", 10, None).await.unwrap();
        assert!(hits.is_empty());

        let stats = store.stats().await;
        assert_eq!(stats["empty"].corpus_size, 0);
    }

    #[tokio::test]
    async fn test_replace_false_preserves_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();
        let outcome = store
            .create("pets", &[Chunk::new("n1", "entirely new corpus")], false, false)
            .await
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::Exists { chunk_count: 3 }));

        // Prior index's results are unchanged.
        let hits = store.search("pets", "cat", 1, None).await.unwrap();
        assert_eq!(hits[0].chunk_id, "c1");
    }

    #[tokio::test]
    async fn test_replace_true_swaps_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();
        store
            .create("pets", &[Chunk::new("n1", "ferrets only here")], true, false)
            .await
            .unwrap();

        // Old chunk ids are no longer retrievable.
        let hits = store.search("pets", "cat", 10, None).await.unwrap();
        assert!(hits.is_empty());
        let hits = store.search("pets", "ferrets", 10, None).await.unwrap();
        assert_eq!(hits[0].chunk_id, "n1");
    }

    #[tokio::test]
    async fn test_failed_build_leaves_previous_ready_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();

        let dup = vec![Chunk::new("d1", "x"), Chunk::new("d1", "y")];
        let err = store.create("pets", &dup, true, false).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));

        let hits = store.search("pets", "cat", 1, None).await.unwrap();
        assert_eq!(hits[0].chunk_id, "c1");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();
        store.delete("pets").await.unwrap();

        let err = store.search("pets", "cat", 10, None).await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));

        store.delete("pets").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_lazy_load_from_disk_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = test_store(&dir);
            store.create("pets", &pet_chunks(), true, false).await.unwrap();
        }

        // A fresh store over the same directory simulates a restart.
        let store = test_store(&dir);
        let hits = store.search("pets", "cat", 1, None).await.unwrap();
        assert_eq!(hits[0].chunk_id, "c1");

        let stats = store.stats().await;
        assert_eq!(stats["pets"].chunk_count, 3);
    }

    #[tokio::test]
    async fn test_replace_false_sees_disk_only_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = test_store(&dir);
            store.create("pets", &pet_chunks(), true, false).await.unwrap();
        }

        let store = test_store(&dir);
        let outcome = store
            .create("pets", &[Chunk::new("n1", "new")], false, false)
            .await
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::Exists { chunk_count: 3 }));
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts_before_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("pets", &pet_chunks(), true, false).await.unwrap();
        let expired = Instant::now() - std::time::Duration::from_millis(1);
        let err = store
            .search("pets", "cat", 10, Some(expired))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn test_stats_lists_only_ready_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        store.create("a", &pet_chunks(), true, false).await.unwrap();
        store.create("b", &[Chunk::new("x", "solo")], true, false).await.unwrap();
        store.delete("b").await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["a"].chunk_count, 3);
    }

    #[tokio::test]
    async fn test_search_results_attach_chunk_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let chunks = vec![Chunk::with_metadata(
            "c1",
            "rust ownership rules",
            serde_json::json!({"url": "https://example.com/ownership"}),
        )];
        store.create("docs", &chunks, true, false).await.unwrap();

        let hits = store.search("docs", "ownership", 5, None).await.unwrap();
        assert_eq!(hits[0].metadata["url"], "https://example.com/ownership");
    }
}
