//! Document loading
//!
//! A loader turns a file into a single plain-text [`Document`]. Format
//! specific extraction lives behind [`DocumentLoader`]; the rest of the crate
//! only ever sees text.

use std::path::Path;

use crate::{Error, Result};

/// Raw text extracted from one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source identifier, the file name of the loaded path
    pub source: String,
    /// Extracted text
    pub text: String,
}

impl Document {
    /// Wrap already-extracted text. Fails with [`Error::EmptyInput`] when the
    /// text holds nothing but whitespace.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyInput(format!("no text extracted from {source}")));
        }
        Ok(Self { source, text })
    }
}

/// Trait for format-specific text extraction
pub trait DocumentLoader {
    /// Extract the text of the file at `path`
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Load `path` with the loader matching its extension: PDF for `.pdf`,
/// plain text for anything else.
pub fn load_document(path: &Path) -> Result<Document> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        PdfLoader.load(path)
    } else {
        TextLoader.load(path)
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

mod pdf;
mod text;

pub use pdf::*;
pub use text::*;
