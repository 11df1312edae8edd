//! Error types for niebot

use thiserror::Error;

/// Result type alias for niebot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in niebot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking, search or settings parameters are out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to work with: no index entries, or no text in a document
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Persisted index is unreadable or inconsistent
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// An external collaborator (document extractor, embedding model,
    /// generative model) failed. The message is passed through as reported.
    #[error("collaborator failure: {0}")]
    Collaborator(String),

    /// A vector did not have the dimension the index or embedder expects
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
