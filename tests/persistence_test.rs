//! Integration tests for index persistence
//!
//! Exercises the save/load round trip through a simulated restart, partial
//! on-disk state, and storage key collisions.

use bm25d::chunk::Chunk;
use bm25d::index::Bm25Params;
use bm25d::storage::{sanitize_key, IndexStorage};
use bm25d::store::IndexStore;
use serde_json::json;

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk::with_metadata("c1", "rust ownership and borrowing", json!({"page": 1})),
        Chunk::with_metadata("c2", "garbage collection in java", json!({"page": 2})),
        Chunk::with_metadata("c3", "ownership rules in rust", json!({"page": 3})),
    ]
}

#[tokio::test]
async fn scores_survive_restart_exactly() {
    let dir = tempfile::tempdir().unwrap();

    let before = {
        let store = IndexStore::new(
            IndexStorage::new(dir.path()).unwrap(),
            Bm25Params::default(),
        );
        store.create("book", &chunks(), true, false).await.unwrap();
        store.search("book", "rust ownership", 10, None).await.unwrap()
    };

    // New store over the same directory: nothing in memory, lazy load.
    let store = IndexStore::new(
        IndexStorage::new(dir.path()).unwrap(),
        Bm25Params::default(),
    );
    let after = store.search("book", "rust ownership", 10, None).await.unwrap();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.chunk_id, a.chunk_id);
        assert_eq!(b.rank, a.rank);
        assert!((b.score - a.score).abs() < 1e-6);
        assert_eq!(b.metadata, a.metadata);
    }
}

#[tokio::test]
async fn partial_on_disk_state_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = IndexStore::new(
            IndexStorage::new(dir.path()).unwrap(),
            Bm25Params::default(),
        );
        store.create("book", &chunks(), true, false).await.unwrap();
    }

    // Simulate a metadata file surviving without its artifact.
    let key = sanitize_key("book");
    std::fs::remove_file(dir.path().join(format!("{}.index.json", key))).unwrap();

    let store = IndexStore::new(
        IndexStorage::new(dir.path()).unwrap(),
        Bm25Params::default(),
    );
    let result = store.search("book", "rust", 10, None).await;
    assert!(matches!(result, Err(bm25d::IndexError::NotFound(_))));
}

#[tokio::test]
async fn collections_with_colliding_display_names_stay_separate() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::new(
        IndexStorage::new(dir.path()).unwrap(),
        Bm25Params::default(),
    );

    // Both names sanitize to the same character prefix.
    store
        .create("a/b.txt", &[Chunk::new("slash", "about slashes")], true, false)
        .await
        .unwrap();
    store
        .create("a_b.txt", &[Chunk::new("under", "about underscores")], true, false)
        .await
        .unwrap();

    let slash_hits = store.search("a/b.txt", "slashes", 10, None).await.unwrap();
    let under_hits = store.search("a_b.txt", "underscores", 10, None).await.unwrap();
    assert_eq!(slash_hits[0].chunk_id, "slash");
    assert_eq!(under_hits[0].chunk_id, "under");

    // Deleting one leaves the other intact on disk.
    store.delete("a/b.txt").await.unwrap();
    let store2 = IndexStore::new(
        IndexStorage::new(dir.path()).unwrap(),
        Bm25Params::default(),
    );
    assert!(store2.search("a/b.txt", "slashes", 10, None).await.is_err());
    assert_eq!(
        store2.search("a_b.txt", "underscores", 10, None).await.unwrap()[0].chunk_id,
        "under"
    );
}

#[tokio::test]
async fn deleted_collection_does_not_resurrect_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = IndexStore::new(
            IndexStorage::new(dir.path()).unwrap(),
            Bm25Params::default(),
        );
        store.create("book", &chunks(), true, false).await.unwrap();
        store.delete("book").await.unwrap();
    }

    let store = IndexStore::new(
        IndexStorage::new(dir.path()).unwrap(),
        Bm25Params::default(),
    );
    let result = store.search("book", "rust", 10, None).await;
    assert!(matches!(result, Err(bm25d::IndexError::NotFound(_))));
}
