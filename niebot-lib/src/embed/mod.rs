//! Text embedding
//!
//! Two providers ship with the crate:
//!
//! - [`MiniLmEmbedder`]: sentence-transformers/all-MiniLM-L6-v2 via the
//!   fastembed crate (ONNX runtime), 384 dimensions. Downloads the model on
//!   first use.
//! - [`NgramEmbedder`]: hashed character trigrams. Deterministic and offline,
//!   good enough for keyword-ish lookups and for tests.
//!
//! # Usage
//!
//! ```ignore
//! use niebot_lib::embed::{Embedder, MiniLmEmbedder};
//!
//! let mut embedder = MiniLmEmbedder::new()?;
//! let vectors = embedder.embed_batch(&["Module 1...", "Module 2..."])?;
//! let query = embedder.embed("What is taught in module 2?")?;
//! ```

use crate::{Error, Result};

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple texts, returning one vector per input in input order
    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single text
    fn embed(&mut self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Collaborator(format!("{} returned no embeddings", self.model_name())))
    }

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed_batch(texts)
    }

    fn embed(&mut self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

mod minilm;
mod ngram;

pub use minilm::*;
pub use ngram::*;
