//! Layered configuration.
//!
//! Uses Figment to merge, lowest priority first:
//! 1. built-in defaults ([`Settings::default`])
//! 2. `niebot.toml` in the working directory, or an explicit config file
//! 3. `NIEBOT_*` environment variables, `__` separating nested keys
//!    (`NIEBOT_OLLAMA__MODEL=mistral`)
//!
//! The CLI applies its own flags on top of the extracted [`Settings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::chunk::Splitter;
use crate::embed::{Embedder, MiniLmEmbedder, NgramEmbedder};
use crate::generate::OllamaGenerator;
use crate::pipeline::PipelineOptions;
use crate::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "niebot.toml";
pub const ENV_PREFIX: &str = "NIEBOT_";

/// Which embedding provider to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// sentence-transformers/all-MiniLM-L6-v2 via fastembed
    MiniLm,
    /// offline hashed trigrams
    Ngram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Document to index when no persisted index exists
    pub document: PathBuf,
    /// Directory holding the persisted index
    pub index_dir: PathBuf,
    /// Maximum chunk length in chars
    pub chunk_size: usize,
    /// Chars shared by consecutive chunks
    pub overlap: usize,
    /// Number of chunks retrieved per query
    pub top_k: usize,
    pub embedder: EmbedderKind,
    /// Output dimension of the ngram embedder
    pub ngram_dimension: usize,
    /// Pass retrieved chunks to the generative model instead of printing them
    pub synthesize: bool,
    pub ollama: OllamaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document: PathBuf::from("doc/4thsem_syllabus.pdf"),
            index_dir: PathBuf::from("vector_index"),
            chunk_size: 1000,
            overlap: 200,
            top_k: 3,
            embedder: EmbedderKind::MiniLm,
            ngram_dimension: 256,
            synthesize: false,
            ollama: OllamaSettings::default(),
        }
    }
}

impl Settings {
    /// The provider stack for `config_file`, or `niebot.toml` when `None`.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment> {
        let file = match config_file {
            Some(path) if !path.is_file() => {
                return Err(Error::InvalidConfig(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate settings.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(config_file)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        Splitter::new(self.chunk_size, self.overlap)?;
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be greater than zero".to_string()));
        }
        if self.embedder == EmbedderKind::Ngram && self.ngram_dimension == 0 {
            return Err(Error::InvalidConfig(
                "ngram_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn splitter(&self) -> Result<Splitter> {
        Splitter::new(self.chunk_size, self.overlap)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            top_k: self.top_k,
            synthesize: self.synthesize,
        }
    }

    /// Construct the configured embedding provider. MiniLM downloads its
    /// model on first use.
    pub fn embedder(&self) -> Result<Box<dyn Embedder>> {
        let embedder: Box<dyn Embedder> = match self.embedder {
            EmbedderKind::MiniLm => Box::new(MiniLmEmbedder::new()?),
            EmbedderKind::Ngram => Box::new(NgramEmbedder::new(self.ngram_dimension)?),
        };
        Ok(embedder)
    }

    /// The generative model, only when synthesis is switched on.
    pub fn generator(&self) -> Option<OllamaGenerator> {
        self.synthesize.then(|| {
            OllamaGenerator::new(
                self.ollama.url.clone(),
                self.ollama.model.clone(),
                Duration::from_secs(self.ollama.timeout_secs),
            )
        })
    }
}
