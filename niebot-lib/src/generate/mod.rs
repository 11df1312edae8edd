//! Generative answer synthesis
//!
//! A [`Generator`] turns retrieved context plus the user's question into a
//! natural-language answer. The query pipeline only calls it when synthesis
//! is switched on.

use crate::{Error, Result};

pub trait Generator: Send + Sync {
    /// Answer `query` using only `context`
    fn generate(&mut self, context: &str, query: &str) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Placeholder for pipelines that never synthesize. Asking it to generate
/// is a configuration error.
pub struct NoGenerator;

impl Generator for NoGenerator {
    fn generate(&mut self, _context: &str, _query: &str) -> Result<String> {
        Err(Error::InvalidConfig(
            "synthesis is enabled but no generative model is configured".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

/// Build the instruction prompt sent to a text-completion model.
#[must_use]
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "You answer questions about NIE Mysuru using only the context below. \
         If the context does not contain the answer, say that the question is out of scope.\n\n\
         Context:\n{context}\n\nQuestion: {query}\n\nAnswer:"
    )
}

mod ollama;

pub use ollama::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_generator_is_config_error() {
        let err = NoGenerator.generate("context", "question").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(NoGenerator.model_name(), "none");
    }

    #[test]
    fn test_prompt_carries_context_and_question() {
        let prompt = build_prompt("From faq.txt:\nNIE was established in 1946.", "When?");
        assert!(prompt.contains("Context:\nFrom faq.txt:\nNIE was established in 1946."));
        assert!(prompt.ends_with("Question: When?\n\nAnswer:"));
    }
}
