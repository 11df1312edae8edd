use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const GRAM: usize = 3;

/// Hashing embedder over lowercase character trigrams.
///
/// Each trigram is hashed with xxHash64 (seed 0) into one of `dimension`
/// buckets and the counts are L2-normalized. Output is stable across runs
/// and platforms, so indices built with it can be persisted.
#[derive(Debug, Clone)]
pub struct NgramEmbedder {
    dimension: usize,
}

impl NgramEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "ngram embedder dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        let padded: Vec<char> = std::iter::once(' ')
            .chain(text.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();

        for gram in padded.windows(GRAM.min(padded.len())) {
            if gram.iter().all(|c| c.is_whitespace()) {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            for c in gram {
                hasher.write_u32(u32::from(*c));
            }
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Embedder for NgramEmbedder {
    fn model_name(&self) -> &str {
        "ngram-xxh64-3"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
