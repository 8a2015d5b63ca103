//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing or querying documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// A single file could not be read or extracted.
    ///
    /// Ingestion of a batch logs and skips these; they never abort the batch.
    #[error("Failed to load {path}: {message}")]
    LoadError {
        /// The path that failed.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The persistent collection could not be opened or created.
    #[error("Failed to open vector store at {location}: {message}")]
    StoreInitError {
        /// The storage location that was being opened.
        location: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion call failed.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend after it was opened.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Missing or malformed configuration, or invalid arguments.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl RagError {
    pub(crate) fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadError { path: path.into(), message: message.into() }
    }
}

/// A convenience result type for docqa operations.
pub type Result<T> = std::result::Result<T, RagError>;
