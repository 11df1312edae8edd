use std::path::Path;

use tracing::debug;

use crate::document::{source_name, Document, DocumentLoader};
use crate::Result;

/// Loader for UTF-8 plain text and markdown files
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        let text = std::fs::read_to_string(path)?;
        debug!("Read {} bytes from {}", text.len(), path.display());
        Document::new(source_name(path), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::load_document;
    use crate::Error;

    #[test]
    fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syllabus.txt");
        std::fs::write(&path, "Module 1: Graph theory").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.source, "syllabus.txt");
        assert_eq!(doc.text, "Module 1: Graph theory");
    }

    #[test]
    fn test_whitespace_only_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.md");
        std::fs::write(&path, " \n\n\t ").unwrap();

        let err = TextLoader.load(&path).unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)));
    }
}
