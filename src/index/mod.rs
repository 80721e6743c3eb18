//! Index module
//!
//! The BM25 scoring engine, the index builder, and the metadata that ties
//! artifact document indices back to chunk ids.

mod bm25;
mod builder;
mod metadata;

pub use bm25::{Bm25Artifact, Bm25Params, ARTIFACT_SCHEMA_VERSION};
pub use builder::build_index;
pub use metadata::{IndexMetadata, METADATA_SCHEMA_VERSION};
