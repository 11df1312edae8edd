use std::path::Path;

use tracing::{debug, info};

use crate::document::{source_name, Document, DocumentLoader};
use crate::{Error, Result};

/// PDF text extraction via the `pdf-extract` crate.
///
/// Pages are concatenated in order. Scanned PDFs without a text layer yield
/// no text and fail with [`Error::EmptyInput`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        debug!("Looking for PDF at {}", path.display());
        let bytes = std::fs::read(path)?;

        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| Error::Collaborator(format!("{}: {e}", path.display())))?;
        info!("Extracted {} chars from {}", text.chars().count(), path.display());

        Document::new(source_name(path), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PdfLoader.load(Path::new("does/not/exist.pdf")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_garbage_is_collaborator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfLoader.load(&path).unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)), "got {err:?}");
    }
}
