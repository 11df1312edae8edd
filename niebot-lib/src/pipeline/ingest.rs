use tracing::{debug, info};

use crate::chunk::{Chunk, Splitter};
use crate::config::Settings;
use crate::document::{load_document, Document};
use crate::embed::Embedder;
use crate::store::{IndexEntry, Metadata, VectorIndex, CHUNK_KEY, SOURCE_KEY};
use crate::{Error, Result};

/// Chunk `document`, embed every chunk and build a fresh index.
///
/// Embeddings are requested in one order-preserving batch so entry `i`
/// always holds chunk `i`. Fails with [`Error::EmptyInput`] when the document
/// produces no chunks.
pub fn index_document<E>(embedder: &mut E, splitter: &Splitter, document: &Document) -> Result<VectorIndex>
where
    E: Embedder + ?Sized,
{
    let chunks: Vec<Chunk> = splitter.split(&document.text, &document.source).collect();
    info!(
        "Split {} into {} chunks (size {}, overlap {})",
        document.source,
        chunks.len(),
        splitter.chunk_size(),
        splitter.overlap()
    );
    if chunks.is_empty() {
        return Err(Error::EmptyInput(format!("{} produced no chunks", document.source)));
    }

    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts)?;
    if embeddings.len() != chunks.len() {
        return Err(Error::Collaborator(format!(
            "{} returned {} embeddings for {} chunks",
            embedder.model_name(),
            embeddings.len(),
            chunks.len()
        )));
    }
    debug!("Embedded {} chunks with {}", chunks.len(), embedder.model_name());

    let dimension = embedder.dimension();
    let entries = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, vector)| {
            if vector.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            let mut metadata = Metadata::new();
            metadata.insert(SOURCE_KEY.to_string(), chunk.metadata.source_id);
            metadata.insert(CHUNK_KEY.to_string(), chunk.metadata.position.to_string());
            Ok(IndexEntry::new(vector, chunk.content, metadata))
        })
        .collect::<Result<Vec<_>>>()?;

    VectorIndex::build(entries)
}

/// Load the index at `settings.index_dir`, or build it from
/// `settings.document` and save it there when the directory does not exist.
///
/// A persisted index whose dimension differs from the embedder's is
/// reported as [`Error::CorruptIndex`]; use [`rebuild_index`] to replace it.
pub fn open_or_build<E>(settings: &Settings, embedder: &mut E) -> Result<VectorIndex>
where
    E: Embedder + ?Sized,
{
    if settings.index_dir.exists() {
        info!("Loading existing index from {}", settings.index_dir.display());
        return VectorIndex::load_with_dimension(&settings.index_dir, embedder.dimension());
    }
    rebuild_index(settings, embedder)
}

/// Build the index from `settings.document` and save it, replacing whatever
/// is persisted at `settings.index_dir`.
pub fn rebuild_index<E>(settings: &Settings, embedder: &mut E) -> Result<VectorIndex>
where
    E: Embedder + ?Sized,
{
    let splitter = settings.splitter()?;
    let document = load_document(&settings.document)?;
    let index = index_document(embedder, &splitter, &document)?;
    index.save(&settings.index_dir)?;
    Ok(index)
}
