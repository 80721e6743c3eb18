//! Index builder
//!
//! Orchestrates corpus tokenization and engine construction for one named
//! collection, producing the immutable artifact together with its metadata.

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};
use crate::index::{Bm25Artifact, Bm25Params, IndexMetadata};
use crate::tokenizer;
use std::collections::HashSet;

/// Build a BM25 artifact and its metadata from a chunk corpus
///
/// Input order is preserved: artifact document index `i` maps back to
/// `chunks[i]`. An empty chunk list produces a valid empty artifact with
/// `corpus_size = 0` rather than an error, so callers can distinguish
/// "no chunks" from "build failed".
pub fn build_index(
    chunks: &[Chunk],
    collection: &str,
    params: Bm25Params,
) -> Result<(Bm25Artifact, IndexMetadata)> {
    let mut seen_ids: HashSet<&str> = HashSet::with_capacity(chunks.len());
    for chunk in chunks {
        if chunk.id.is_empty() {
            return Err(IndexError::InvalidInput(format!(
                "chunk with empty id in collection '{}'",
                collection
            )));
        }
        if !seen_ids.insert(chunk.id.as_str()) {
            return Err(IndexError::InvalidInput(format!(
                "duplicate chunk id '{}' in collection '{}'",
                chunk.id, collection
            )));
        }
    }

    let corpus: Vec<Vec<String>> = chunks.iter().map(|c| tokenizer::tokenize(&c.text)).collect();

    let artifact = Bm25Artifact::build(&corpus, params);
    let metadata = IndexMetadata::new(collection, chunks);

    debug_assert!(metadata.is_consistent_with(&artifact));

    tracing::debug!(
        "Built index for '{}': {} chunks, avg doc length {:.1}",
        collection,
        metadata.chunk_count,
        artifact.avg_doc_length()
    );

    Ok((artifact, metadata))
}
