//! Index persistence
//!
//! Serializes artifact/metadata pairs to durable storage, keyed by a
//! sanitized collection name. The two files are written together and read
//! together: a pair that is partial, unparsable, or mutually inconsistent
//! is reported as absent, never as data.

use crate::index::{
    Bm25Artifact, IndexMetadata, ARTIFACT_SCHEMA_VERSION, METADATA_SCHEMA_VERSION,
};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest sanitized name prefix kept in a storage key
const KEY_PREFIX_MAX_LEN: usize = 64;

/// Sanitize a collection name into a filesystem-safe storage key
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, and a 12-hex-digit
/// SHA-256 suffix of the original name keeps distinct names from ever
/// colliding on the same key.
pub fn sanitize_key(collection: &str) -> String {
    let safe: String = collection
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(KEY_PREFIX_MAX_LEN)
        .collect();

    let digest = Sha256::digest(collection.as_bytes());
    format!("{}-{}", safe, &hex::encode(digest)[..12])
}

/// File-backed store of artifact/metadata pairs
#[derive(Debug, Clone)]
pub struct IndexStorage {
    /// Directory holding one `.index.json` and one `.meta.json` per collection
    root: PathBuf,
}

impl IndexStorage {
    /// Open (and create if needed) a storage directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage dir {}", root.display()))?;
        Ok(Self { root })
    }

    /// Storage directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self, collection: &str) -> PathBuf {
        self.root
            .join(format!("{}.index.json", sanitize_key(collection)))
    }

    fn metadata_path(&self, collection: &str) -> PathBuf {
        self.root
            .join(format!("{}.meta.json", sanitize_key(collection)))
    }

    /// Persist an artifact/metadata pair
    ///
    /// Each file is written to a temporary sibling and renamed into place,
    /// so a concurrent `load` observes either the old pair or the new one,
    /// never a torn file.
    pub fn save(
        &self,
        collection: &str,
        artifact: &Bm25Artifact,
        metadata: &IndexMetadata,
    ) -> Result<()> {
        let index_json = serde_json::to_string_pretty(artifact)?;
        let meta_json = serde_json::to_string_pretty(metadata)?;

        write_atomic(&self.index_path(collection), index_json.as_bytes())?;
        write_atomic(&self.metadata_path(collection), meta_json.as_bytes())?;

        tracing::info!(
            "Saved index for '{}' ({} chunks) to {}",
            collection,
            metadata.chunk_count,
            self.root.display()
        );
        Ok(())
    }

    /// Load an artifact/metadata pair, verifying mutual consistency
    ///
    /// Returns `Ok(None)` when either file is missing, or when the pair
    /// fails schema-version, well-formedness, or alignment checks; only io
    /// failures on files that exist become errors.
    pub fn load(&self, collection: &str) -> Result<Option<(Bm25Artifact, IndexMetadata)>> {
        let index_path = self.index_path(collection);
        let metadata_path = self.metadata_path(collection);

        if !index_path.exists() || !metadata_path.exists() {
            return Ok(None);
        }

        let index_json = fs::read_to_string(&index_path)
            .with_context(|| format!("Failed to read {}", index_path.display()))?;
        let meta_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read {}", metadata_path.display()))?;

        let artifact: Bm25Artifact = match serde_json::from_str(&index_json) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!("Corrupt index file for '{}': {}", collection, e);
                return Ok(None);
            }
        };
        let metadata: IndexMetadata = match serde_json::from_str(&meta_json) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Corrupt metadata file for '{}': {}", collection, e);
                return Ok(None);
            }
        };

        if artifact.schema_version != ARTIFACT_SCHEMA_VERSION
            || metadata.schema_version != METADATA_SCHEMA_VERSION
        {
            tracing::warn!(
                "Schema version mismatch for '{}' (index {:?}, metadata {:?}); treating as absent",
                collection,
                artifact.schema_version,
                metadata.schema_version
            );
            return Ok(None);
        }

        if !artifact.is_well_formed() || !metadata.is_consistent_with(&artifact) {
            tracing::warn!(
                "Inconsistent artifact/metadata pair for '{}'; treating as absent",
                collection
            );
            return Ok(None);
        }

        tracing::info!(
            "Loaded index for '{}' ({} chunks) from disk",
            collection,
            metadata.chunk_count
        );
        Ok(Some((artifact, metadata)))
    }

    /// Remove the persisted pair for a collection, if any
    pub fn remove(&self, collection: &str) -> Result<()> {
        for path in [self.index_path(collection), self.metadata_path(collection)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to remove {}", path.display()));
                }
            }
        }
        Ok(())
    }
}

/// Write to a temporary sibling, then rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to rename {} into place", tmp.display()))?;
    Ok(())
}
