//! Vector storage
//!
//! # Storage Model
//!
//! Each stored item is an [`IndexEntry`]:
//! - the embedding vector
//! - the chunk text it was computed from
//! - a string-to-string metadata map (`source`, `chunk`, ...)
//!
//! Entries keep their insertion order, which is also the tie-break order for
//! equal similarity scores.
//!
//! # Usage
//!
//! ```ignore
//! use niebot_lib::store::{VectorIndex, VectorStore};
//!
//! let index = VectorIndex::build(entries)?;
//! index.save(Path::new("vector_index"))?;
//!
//! let index = VectorIndex::load(Path::new("vector_index"))?;
//! let results = index.search(&query_embedding, 3)?;
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::Result;

/// Free-form entry metadata, ordered so persisted output is stable
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the source document identifier
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the chunk sequence index
pub const CHUNK_KEY: &str = "chunk";

/// One stored vector with the text and metadata it represents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Embedding,
    pub text: String,
    pub metadata: Metadata,
}

impl IndexEntry {
    #[must_use]
    pub fn new(vector: Embedding, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            vector,
            text: text.into(),
            metadata,
        }
    }
}

/// A search result with similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The matched text
    pub text: String,
    /// Metadata stored with the match
    pub metadata: Metadata,
    /// Cosine similarity to the query, in [-1.0, 1.0] (higher is more similar)
    pub score: f32,
}

impl SearchResult {
    /// The `source` metadata value, if present
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Append entries, keeping their order
    fn insert(&mut self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Search for similar entries
    ///
    /// # Arguments
    /// * `query` - The query vector
    /// * `k` - Maximum number of results to return, must be non-zero
    ///
    /// # Returns
    /// Top-k results sorted by similarity (highest first). An empty store
    /// yields an empty vector.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Get total number of stored entries
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored data
    fn clear(&mut self);
}

mod flat;
mod persist;

pub use flat::*;
