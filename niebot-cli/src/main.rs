//! niebot CLI - ask questions about NIE Mysuru documents
//!
//! # Commands
//!
//! ```bash
//! # Interactive chat (builds the index on first run)
//! niebot
//!
//! # One-shot question
//! niebot ask "What subjects are in the 4th semester?"
//!
//! # Rebuild the index from a document
//! niebot index --document doc/4thsem_syllabus.pdf
//!
//! # Chunk a document and show results
//! niebot chunk doc/4thsem_syllabus.pdf --size 500 --overlap 50
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use niebot_lib::{
    config::{EmbedderKind, Settings},
    document::load_document,
    embed::Embedder,
    generate::{Generator, OllamaGenerator},
    pipeline::{open_or_build, rebuild_index, QueryPipeline},
    store::{VectorIndex, VectorStore},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "niebot")]
#[command(about = "Answer questions about NIE Mysuru from its documents")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./niebot.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document to index
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Directory of the persisted index
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Number of chunks to retrieve per question
    #[arg(short = 'k', long, global = true)]
    top_k: Option<usize>,

    /// Synthesize answers with the configured Ollama model
    #[arg(short, long, global = true)]
    synthesize: bool,

    /// Use the offline n-gram embedder instead of MiniLM
    #[arg(long, global = true)]
    ngram: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop (default)
    Chat,

    /// Answer a single question
    Ask {
        /// The question
        query: String,
    },

    /// Build the index from the document and save it, replacing any existing one
    Index,

    /// Chunk a document and preview the chunks
    Chunk {
        /// Input file to chunk
        input: PathBuf,

        /// Maximum chunk size in chars
        #[arg(long)]
        size: Option<usize>,

        /// Chars shared between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },
}

impl Cli {
    /// Configured settings with command line overrides applied.
    fn settings(&self) -> Result<Settings> {
        let mut settings =
            Settings::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(document) = &self.document {
            settings.document = document.clone();
        }
        if let Some(index_dir) = &self.index_dir {
            settings.index_dir = index_dir.clone();
        }
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        if self.synthesize {
            settings.synthesize = true;
        }
        if self.ngram {
            settings.embedder = EmbedderKind::Ngram;
        }
        if let Some(Commands::Chunk { size, overlap, .. }) = &self.command {
            settings.chunk_size = size.unwrap_or(settings.chunk_size);
            settings.overlap = overlap.unwrap_or(settings.overlap);
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chunk { input, .. } => {
            let document = load_document(&input)?;
            let splitter = settings.splitter()?;
            let chunks: Vec<_> = splitter.split(&document.text, &document.source).collect();

            println!(
                "Chunked '{}' into {} chunks (size {}, overlap {}):\n",
                input.display(),
                chunks.len(),
                splitter.chunk_size(),
                splitter.overlap()
            );
            for chunk in &chunks {
                println!(
                    "--- Chunk {} (chars {}..{}) ---",
                    chunk.metadata.position + 1,
                    chunk.metadata.start,
                    chunk.metadata.end
                );
                // Show preview (first 200 chars)
                let preview: String = chunk.content.chars().take(200).collect();
                let ellipsis = if chunk.content.chars().count() > 200 { "..." } else { "" };
                println!("{preview}{ellipsis}\n");
            }
        }

        Commands::Index => {
            let mut embedder = settings.embedder()?;
            println!("Indexing '{}' with {}...", settings.document.display(), embedder.model_name());
            let index = rebuild_index(&settings, &mut embedder)?;
            println!(
                "Done! Saved {} chunks to {}",
                index.len(),
                settings.index_dir.display()
            );
        }

        Commands::Ask { query } => {
            let (mut pipeline, index) = prepare(&settings)?;
            println!("{}", pipeline.answer(&index, &query)?);
        }

        Commands::Chat => {
            let (mut pipeline, index) = prepare(&settings)?;
            println!("NIE Mysuru chatbot is ready. Type your question (or 'exit' to quit):");
            let stdin = io::stdin();
            chat(&mut pipeline, &index, stdin.lock(), io::stdout())?;
        }
    }

    Ok(())
}

type CliPipeline = QueryPipeline<Box<dyn Embedder>, OllamaGenerator>;

/// Open or build the index and assemble the query pipeline.
fn prepare(settings: &Settings) -> Result<(CliPipeline, VectorIndex)> {
    let mut embedder = settings.embedder()?;
    let index = open_or_build(settings, &mut embedder).with_context(|| open_failure(settings))?;
    info!("Index ready with {} chunks", index.len());

    let pipeline =
        QueryPipeline::from_parts(embedder, settings.generator(), settings.pipeline_options());
    Ok((pipeline, index))
}

fn open_failure(settings: &Settings) -> String {
    format!(
        "Failed to open index at {} (run `niebot index` to rebuild it)",
        settings.index_dir.display()
    )
}

fn is_exit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Read questions line by line until `exit`, `quit` or end of input,
/// writing one answer per question. A failed question is reported and the
/// loop carries on.
fn chat<E, G, S>(
    pipeline: &mut QueryPipeline<E, G>,
    index: &S,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<()>
where
    E: Embedder,
    G: Generator,
    S: VectorStore,
{
    let mut lines = input.lines();
    loop {
        write!(output, "\nYou: ")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        match pipeline.answer(index, query) {
            Ok(answer) => writeln!(output, "\nBot: {answer}")?,
            Err(e) => writeln!(output, "\nBot: Something went wrong: {e}")?,
        }
    }

    writeln!(output, "\nGoodbye!")?;
    Ok(())
}
