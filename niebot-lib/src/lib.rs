//! niebot - retrieval-augmented question answering over institution documents
//!
//! # Architecture
//!
//! ```text
//! Document -> Splitter -> Embedder -> VectorIndex --save/load--> disk
//!                                          |
//! Query -> Embedder -> search <------------+
//!                        |
//!                  ranked chunks -> [Generator] -> answer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use niebot_lib::{config::Settings, pipeline::{open_or_build, QueryPipeline}};
//!
//! let settings = Settings::load(None)?;
//! let mut embedder = settings.embedder()?;
//! let index = open_or_build(&settings, &mut embedder)?;
//!
//! let mut pipeline = QueryPipeline::new(embedder, settings.pipeline_options());
//! println!("{}", pipeline.answer(&index, "What are the lab courses?")?);
//! ```

pub mod chunk;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};
