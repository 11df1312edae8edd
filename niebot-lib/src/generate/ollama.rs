use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generate::{build_prompt, Generator};
use crate::{Error, Result};

/// Generator backed by an Ollama server's `/api/generate` endpoint.
///
/// Calls block until the full response arrives. Failures are reported as
/// [`Error::Collaborator`] without retrying.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Body Ollama sends with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Failure message for a non-2xx reply, using the server's own explanation
/// when the body carries one.
fn status_failure(url: &str, status: u16, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string());
    if detail.is_empty() {
        Error::Collaborator(format!("{url}: http status {status}"))
    } else {
        Error::Collaborator(format!("{url}: http status {status}: {detail}"))
    }
}

impl OllamaGenerator {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            agent,
        }
    }
}

impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&mut self, context: &str, query: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(context, query),
            stream: false,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| Error::Collaborator(format!("failed to serialize generate request: {e}")))?;

        debug!("Requesting completion from {} ({})", url, self.model);

        let mut resp = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&body)
            .map_err(|e| Error::Collaborator(format!("{url}: {e}")))?;
        let status = resp.status();
        let text = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Collaborator(format!("{url}: {e}")))?;

        if !status.is_success() {
            return Err(status_failure(&url, status.as_u16(), &text));
        }

        let response: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Collaborator(format!("unexpected response from {url}: {e}")))?;

        Ok(response.response.trim().to_string())
    }
}
