//! Error taxonomy for index operations
//!
//! Every failure that crosses the store boundary is translated into one of
//! these variants before it reaches the API layer, so callers can always
//! distinguish "no matches" from "the system is broken".

use thiserror::Error;

/// Typed failures for the index lifecycle
#[derive(Debug, Error)]
pub enum IndexError {
    /// Malformed request, rejected before touching the registry
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No in-memory entry and no persisted artifact for the collection
    #[error("index not found for collection '{0}'")]
    NotFound(String),

    /// Tokenization or engine construction failed during create
    #[error("failed to build index for collection '{collection}': {source}")]
    BuildFailure {
        /// Collection being built
        collection: String,
        /// Underlying build error
        #[source]
        source: anyhow::Error,
    },

    /// Durable save/load error
    #[error("persistence error for collection '{collection}': {source}")]
    Persistence {
        /// Collection being persisted or loaded
        collection: String,
        /// Underlying storage error
        #[source]
        source: anyhow::Error,
    },

    /// Caller deadline expired before scoring began
    #[error("deadline expired before searching collection '{0}'")]
    DeadlineExceeded(String),

    /// Unexpected failure, surfaced with operation context
    #[error("internal error during {operation} on collection '{collection}': {source}")]
    Internal {
        /// Collection the operation targeted
        collection: String,
        /// Operation that failed
        operation: String,
        /// Underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl IndexError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::BuildFailure { .. } => "build_failure",
            Self::Persistence { .. } => "persistence_failure",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Convenience alias for store-level results
pub type Result<T> = std::result::Result<T, IndexError>;
