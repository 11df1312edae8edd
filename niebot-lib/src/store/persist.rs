//! On-disk index layout
//!
//! An index is a directory holding two files:
//!
//! - `manifest.json`: format version, metric, dimension, entry count and the
//!   text + metadata of every entry in order
//! - `vectors.bin`: `count * dimension` little-endian `f32`, entry-major
//!
//! Vectors are stored as raw bits so a reloaded index scores queries exactly
//! like the one that was saved. `vectors.bin` is written first and the
//! manifest last, through a rename, so an interrupted save never leaves a
//! manifest describing vectors that are not on disk.

use std::fs;
use std::io::{self, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::{IndexEntry, Metadata, VectorIndex};
use crate::{Error, Result};

const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";
const VECTORS_FILE: &str = "vectors.bin";
const FORMAT_VERSION: u32 = 1;
const METRIC: &str = "cosine";
const F32_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    metric: String,
    dimension: usize,
    count: usize,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    text: String,
    metadata: Metadata,
}

impl VectorIndex {
    /// Write the index to the directory `dir`, creating it if needed and
    /// replacing any index already there.
    ///
    /// Concurrent saves to the same directory are not synchronised.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let manifest = Manifest {
            version: FORMAT_VERSION,
            metric: METRIC.to_string(),
            dimension: self.dimension,
            count: self.entries.len(),
            entries: self
                .entries
                .iter()
                .map(|e| StoredEntry {
                    text: e.text.clone(),
                    metadata: e.metadata.clone(),
                })
                .collect(),
        };

        // a manifest from a previous save must not outlive the vectors it describes
        let manifest_path = dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }

        let mut bytes = Vec::with_capacity(self.entries.len() * self.dimension * F32_BYTES);
        for entry in &self.entries {
            for x in &entry.vector {
                bytes.extend_from_slice(&x.to_le_bytes());
            }
        }
        fs::write(dir.join(VECTORS_FILE), bytes)?;

        let tmp_path = dir.join(MANIFEST_TMP_FILE);
        let mut writer = BufWriter::new(fs::File::create(&tmp_path)?);
        serde_json::to_writer_pretty(&mut writer, &manifest).map_err(io::Error::from)?;
        writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
        fs::rename(&tmp_path, &manifest_path)?;

        info!(
            "Saved index with {} entries (dimension {}) to {}",
            self.entries.len(),
            self.dimension,
            dir.display()
        );
        Ok(())
    }

    /// Load an index previously written with [`save`](Self::save).
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_bytes = read_part(dir, MANIFEST_FILE)?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| Error::CorruptIndex(format!("{MANIFEST_FILE}: {e}")))?;

        if manifest.version != FORMAT_VERSION {
            return Err(Error::CorruptIndex(format!(
                "unsupported format version {}",
                manifest.version
            )));
        }
        if manifest.metric != METRIC {
            return Err(Error::CorruptIndex(format!("unsupported metric {:?}", manifest.metric)));
        }
        if manifest.dimension == 0 {
            return Err(Error::CorruptIndex("dimension is zero".to_string()));
        }
        if manifest.count != manifest.entries.len() {
            return Err(Error::CorruptIndex(format!(
                "manifest declares {} entries but lists {}",
                manifest.count,
                manifest.entries.len()
            )));
        }

        let row_len = manifest
            .dimension
            .checked_mul(F32_BYTES)
            .ok_or_else(|| Error::CorruptIndex(format!("dimension {} overflows", manifest.dimension)))?;
        let expected_len = manifest.count.checked_mul(row_len).ok_or_else(|| {
            Error::CorruptIndex(format!(
                "{} entries of dimension {} overflow",
                manifest.count, manifest.dimension
            ))
        })?;

        let vector_bytes = read_part(dir, VECTORS_FILE)?;
        if vector_bytes.len() != expected_len {
            return Err(Error::CorruptIndex(format!(
                "{VECTORS_FILE} holds {} bytes, expected {expected_len}",
                vector_bytes.len()
            )));
        }

        let entries = manifest
            .entries
            .into_iter()
            .zip(vector_bytes.chunks_exact(row_len))
            .map(|(stored, raw)| {
                let vector = raw
                    .chunks_exact(F32_BYTES)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                IndexEntry::new(vector, stored.text, stored.metadata)
            })
            .collect::<Vec<_>>();

        debug!("Decoded {} vectors from {}", entries.len(), dir.display());
        info!("Loaded index with {} entries from {}", entries.len(), dir.display());

        Ok(Self {
            dimension: manifest.dimension,
            entries,
        })
    }

    /// Like [`load`](Self::load), but also fail with [`Error::CorruptIndex`]
    /// unless the stored dimension is `dimension`. Use this to check a
    /// persisted index against the embedder that will query it.
    pub fn load_with_dimension(dir: &Path, dimension: usize) -> Result<Self> {
        let index = Self::load(dir)?;
        if index.dimension != dimension {
            return Err(Error::CorruptIndex(format!(
                "index at {} has dimension {}, embedder produces {dimension}",
                dir.display(),
                index.dimension
            )));
        }
        Ok(index)
    }
}

fn read_part(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::CorruptIndex(format!("missing {}", path.display())),
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VectorStore;

    fn sample_index() -> VectorIndex {
        let entries = (0..5u8)
            .map(|i| {
                let f = f32::from(i);
                let mut metadata = Metadata::new();
                metadata.insert("source".to_string(), "4thsem_syllabus.pdf".to_string());
                metadata.insert("chunk".to_string(), i.to_string());
                // awkward values that do not survive a decimal round trip well
                IndexEntry::new(vec![0.1 + f, 1.0 / 3.0, -f * 1e-7, 1.0e-30], format!("chunk {i}"), metadata)
            })
            .collect();
        VectorIndex::build(entries).unwrap()
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();
        index.save(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_round_trip_search_identical() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();
        index.save(dir.path()).unwrap();
        let loaded = VectorIndex::load(dir.path()).unwrap();

        let queries: [[f32; 4]; 3] = [[1.0, 0.0, 0.0, 0.0], [0.3, -2.0, 5.0, 1e-30], [0.0, 0.0, 0.0, 1.0]];
        for query in queries {
            for k in [1, 3, 10] {
                assert_eq!(index.search(&query, k).unwrap(), loaded.search(&query, k).unwrap());
            }
        }
    }

    #[test]
    fn test_empty_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        VectorIndex::new(8).unwrap().save(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension(), 8);
        assert!(loaded.search(&[0.0; 8], 3).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_malformed_manifest_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{ not json").unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_truncated_vectors_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();
        let path = dir.path().join(VECTORS_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 3);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        manifest["count"] = serde_json::json!(4);
        fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_oversized_dimension_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = serde_json::json!({
            "version": 1,
            "metric": "cosine",
            "dimension": 1usize << 62,
            "count": 0,
            "entries": [],
        });
        fs::write(dir.path().join(MANIFEST_FILE), serde_json::to_vec(&manifest).unwrap()).unwrap();
        fs::write(dir.path().join(VECTORS_FILE), b"").unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_oversized_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<_> = (0..3).map(|_| serde_json::json!({"text": "t", "metadata": {}})).collect();
        let manifest = serde_json::json!({
            "version": 1,
            "metric": "cosine",
            "dimension": usize::MAX / 8,
            "count": 3,
            "entries": entries,
        });
        fs::write(dir.path().join(MANIFEST_FILE), serde_json::to_vec(&manifest).unwrap()).unwrap();
        fs::write(dir.path().join(VECTORS_FILE), b"").unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_save_leaves_only_index_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![MANIFEST_FILE, VECTORS_FILE]);
    }

    #[test]
    fn test_interrupted_save_is_not_loadable_as_old_index() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        // a save that died after writing vectors: new vectors, no manifest
        fs::remove_file(dir.path().join(MANIFEST_FILE)).unwrap();
        fs::write(dir.path().join(VECTORS_FILE), [0u8; 8]).unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_expected_dimension_checked() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        assert!(VectorIndex::load_with_dimension(dir.path(), 4).is_ok());
        assert!(matches!(
            VectorIndex::load_with_dimension(dir.path(), 384),
            Err(Error::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_save_overwrites_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        let smaller = VectorIndex::build(vec![IndexEntry::new(vec![1.0, 2.0], "only", Metadata::new())]).unwrap();
        smaller.save(dir.path()).unwrap();

        assert_eq!(VectorIndex::load(dir.path()).unwrap(), smaller);
    }
}
