//! Document chunking
//!
//! Documents are split into overlapping windows of at most `chunk_size`
//! characters. Each window prefers to end on a paragraph break, then a
//! sentence end, then whitespace, and only cuts mid-word when the window
//! holds none of those past the overlap region.
//!
//! # Usage
//!
//! ```ignore
//! use niebot_lib::chunk::Splitter;
//!
//! let splitter = Splitter::new(1000, 200)?;
//! for chunk in splitter.split(&document.text, &document.source) {
//!     println!("{}: {}", chunk.metadata.position, chunk.content);
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A chunk of text with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// The text content of this chunk
    pub content: String,
    /// Where this chunk came from
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ChunkMetadata {
    /// Source document identifier
    pub source_id: String,
    /// Sequence index within the source document (0-indexed)
    pub position: usize,
    /// Char offset of the first character in the source text
    pub start: usize,
    /// Char offset one past the last character in the source text
    pub end: usize,
}

mod splitter;

pub use splitter::*;
