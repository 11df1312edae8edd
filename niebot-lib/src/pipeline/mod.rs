//! Query pipeline
//!
//! Embeds a question, pulls the closest chunks out of a vector store and
//! turns them into an answer: either the ranked chunks themselves, or, with
//! synthesis switched on, a generative model's reply grounded in them.
//!
//! # Usage
//!
//! ```ignore
//! use niebot_lib::pipeline::{open_or_build, PipelineOptions, QueryPipeline};
//!
//! let mut embedder = settings.embedder()?;
//! let index = open_or_build(&settings, &mut embedder)?;
//!
//! let mut pipeline = QueryPipeline::new(embedder, PipelineOptions::default());
//! println!("{}", pipeline.answer(&index, "What is taught in module 3?")?);
//!
//! // With synthesis
//! let mut pipeline = QueryPipeline::with_generator(embedder, generator, options);
//! ```

use tracing::{debug, warn};

use crate::embed::Embedder;
use crate::generate::{Generator, NoGenerator};
use crate::store::{SearchResult, VectorStore};
use crate::Result;

/// Reply for questions nothing in the index relates to
pub const OUT_OF_SCOPE: &str = "Sorry, this question is out of scope.";

const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Hand the retrieved chunks to the generator instead of returning them
    pub synthesize: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            synthesize: false,
        }
    }
}

/// Question answering over a vector store, with optional synthesis.
///
/// Holds no per-query state: every [`answer`](Self::answer) call is
/// independent given an already built or loaded store.
pub struct QueryPipeline<E: Embedder, G: Generator = NoGenerator> {
    embedder: E,
    generator: Option<G>,
    options: PipelineOptions,
}

impl<E: Embedder> QueryPipeline<E, NoGenerator> {
    /// Create a pipeline that always answers with the retrieved text.
    #[must_use]
    pub fn new(embedder: E, options: PipelineOptions) -> Self {
        Self {
            embedder,
            generator: None,
            options,
        }
    }
}

impl<E: Embedder, G: Generator> QueryPipeline<E, G> {
    /// Create a pipeline that can synthesize answers with `generator`.
    #[must_use]
    pub fn with_generator(embedder: E, generator: G, options: PipelineOptions) -> Self {
        Self::from_parts(embedder, Some(generator), options)
    }

    #[must_use]
    pub fn from_parts(embedder: E, generator: Option<G>, options: PipelineOptions) -> Self {
        Self {
            embedder,
            generator,
            options,
        }
    }

    /// Ranked chunks for `query`, best first.
    pub fn retrieve<S: VectorStore>(&mut self, store: &S, query: &str) -> Result<Vec<SearchResult>> {
        retrieve(store, &mut self.embedder, query, self.options.top_k)
    }

    /// Answer `query` from the contents of `store`.
    ///
    /// Returns [`OUT_OF_SCOPE`] when nothing is retrieved. Embedding and
    /// generation failures are returned as-is.
    pub fn answer<S: VectorStore>(&mut self, store: &S, query: &str) -> Result<String> {
        let results = self.retrieve(store, query)?;
        if results.is_empty() {
            return Ok(OUT_OF_SCOPE.to_string());
        }

        if self.options.synthesize {
            match self.generator.as_mut() {
                Some(generator) => {
                    debug!("Synthesizing answer with {}", generator.model_name());
                    return generator.generate(&format_context(&results), query);
                }
                None => warn!("Synthesis requested without a generator, returning retrieved text"),
            }
        }

        Ok(format_answer(&results))
    }

    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

/// Embed `query` and return the `k` most similar entries of `store`.
///
/// An empty store short-circuits to no results without calling the embedder.
pub fn retrieve<S, E>(store: &S, embedder: &mut E, query: &str, k: usize) -> Result<Vec<SearchResult>>
where
    S: VectorStore + ?Sized,
    E: Embedder + ?Sized,
{
    if store.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed(query)?;
    let results = store.search(&query_embedding, k)?;
    debug!("Retrieved {} results for {:?}", results.len(), query);
    Ok(results)
}

/// Answer `query` with the retrieved text only, no synthesis.
pub fn answer<S, E>(store: &S, embedder: &mut E, query: &str, k: usize) -> Result<String>
where
    S: VectorStore + ?Sized,
    E: Embedder + ?Sized,
{
    let results = retrieve(store, embedder, query, k)?;
    if results.is_empty() {
        return Ok(OUT_OF_SCOPE.to_string());
    }
    Ok(format_answer(&results))
}

/// Each result as `From <source>:\n<text>`, blank-line separated, in ranked
/// order.
#[must_use]
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("From {}:\n{}", r.source().unwrap_or(UNKNOWN_SOURCE), r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[must_use]
pub fn format_answer(results: &[SearchResult]) -> String {
    format!("Based on the documents:\n\n{}", format_context(results))
}

mod ingest;

pub use ingest::*;
