use tracing::debug;

use crate::store::{IndexEntry, SearchResult, VectorStore};
use crate::{Error, Result};

/// Flat in-memory vector index.
///
/// Uses brute-force cosine similarity search over every entry, which is
/// plenty for a syllabus-sized corpus (a few thousand chunks). Persist it
/// with [`save`](Self::save) and reopen with [`load`](Self::load).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    pub(crate) dimension: usize,
    pub(crate) entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index accepting vectors of `dimension` floats.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            entries: Vec::new(),
        })
    }

    /// Build a fresh index from `entries`, taking the dimension from the
    /// first vector.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Err(Error::EmptyInput("cannot build an index from zero entries".to_string()));
        };

        let mut index = Self::new(first.vector.len())?;
        index.append(entries)?;
        Ok(index)
    }

    /// Append entries after the existing ones. Nothing is added if any entry
    /// has the wrong dimension.
    pub fn append(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: bad.vector.len(),
            });
        }

        debug!("Appending {} entries to index of {}", entries.len(), self.entries.len());
        self.entries.extend(entries);
        Ok(())
    }

    /// Vector dimension accepted by this index
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl VectorStore for VectorIndex {
    fn insert(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        self.append(entries)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be greater than zero".to_string()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        // stable sort, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let entry = &self.entries[i];
                SearchResult {
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                    score,
                }
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. Zero vectors
/// score 0 against everything.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Metadata;

    fn entry(text: &str, vector: Vec<f32>) -> IndexEntry {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "test.pdf".to_string());
        IndexEntry::new(vector, text, metadata)
    }

    fn texts(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_build_empty_fails() {
        assert!(matches!(VectorIndex::build(Vec::new()), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_build_mixed_dimensions_fails() {
        let entries = vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0, 0.0, 0.0])];
        assert!(matches!(
            VectorIndex::build(entries),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_append_rejects_all_on_mismatch() {
        let mut index = VectorIndex::build(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        let err = index.append(vec![entry("b", vec![0.0, 1.0]), entry("c", vec![1.0])]);

        assert!(err.is_err());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let index = VectorIndex::build(vec![
            entry("a", vec![1.0, 0.0, 0.0]),
            entry("b", vec![0.0, 1.0, 0.0]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(texts(&results), vec!["a"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].source(), Some("test.pdf"));
    }

    #[test]
    fn test_search_returns_sorted() {
        let index = VectorIndex::build(vec![
            entry("far away", vec![0.0, 1.0, 0.0]),
            entry("very close", vec![1.0, 0.0, 0.0]),
            entry("medium", vec![0.5, 0.5, 0.0]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(texts(&results), vec!["very close", "medium", "far away"]);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::build(vec![
            entry("first", vec![0.0, 1.0]),
            entry("second", vec![0.0, 2.0]),
            entry("third", vec![0.0, 3.0]),
        ])
        .unwrap();

        let results = index.search(&[0.0, 1.0], 3).unwrap();
        assert_eq!(texts(&results), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_search_respects_k() {
        let index = VectorIndex::build(vec![
            entry("a", vec![1.0, 0.0]),
            entry("b", vec![0.9, 0.1]),
            entry("c", vec![0.8, 0.2]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_k_larger_than_store() {
        let index = VectorIndex::build(vec![entry("only one", vec![1.0, 0.0])]).unwrap();
        let results = index.search(&[1.0, 0.0], 100).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_empty_search() {
        let index = VectorIndex::new(2).unwrap();
        let results = index.search(&[1.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_k_rejected() {
        let index = VectorIndex::build(vec![entry("a", vec![1.0])]).unwrap();
        assert!(matches!(index.search(&[1.0], 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_query_dimension_checked() {
        let index = VectorIndex::build(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_clear() {
        let mut index = VectorIndex::build(vec![entry("hello", vec![1.0])]).unwrap();
        assert_eq!(index.len(), 1);

        index.clear();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 1);
    }
}
