//! Chunk data type
//!
//! The unit of indexed text: an id, the raw text, and opaque caller-supplied
//! metadata that is stored alongside the index and returned with search
//! results untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn empty_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One indexable chunk of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk identifier, unique within a collection
    pub id: String,
    /// Raw chunk text
    pub text: String,
    /// Opaque key-value metadata (title, url, tags, summary, ...)
    #[serde(default = "empty_metadata")]
    pub metadata: Value,
}

impl Chunk {
    /// Create a chunk without metadata
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: empty_metadata(),
        }
    }

    /// Create a chunk with metadata
    pub fn with_metadata(id: impl Into<String>, text: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_metadata_defaults_to_empty_object() {
        let chunk: Chunk = serde_json::from_str(r#"{"id":"c1","text":"hello"}"#).unwrap();
        assert_eq!(chunk.id, "c1");
        assert_eq!(chunk.metadata, json!({}));
    }

    #[test]
    fn test_chunk_roundtrip_preserves_metadata() {
        let chunk = Chunk::with_metadata("c1", "hello", json!({"title": "T", "tags": ["a", "b"]}));
        let encoded = serde_json::to_string(&chunk).unwrap();
        let decoded: Chunk = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.metadata["title"], "T");
        assert_eq!(decoded.metadata["tags"][1], "b");
    }
}
