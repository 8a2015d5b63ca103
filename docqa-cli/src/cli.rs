//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docqa_rag::{DEFAULT_TOP_K, Settings};

/// Ask questions about your documents.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(about = "Ingest documents and answer questions about them")]
#[command(version)]
pub struct Cli {
    /// Directory holding the vector store (overrides CHROMA_PERSIST_DIRECTORY)
    #[arg(long, global = true)]
    pub persist_dir: Option<PathBuf>,

    /// Collection name (overrides CHROMA_COLLECTION_NAME)
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load, chunk and index files
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        chunking: ChunkingArgs,
    },

    /// Answer a single question
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve (clamped to 1..=20)
        #[arg(short, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },

    /// Remove every indexed chunk from the collection
    Clear,

    /// Interactive question loop
    Chat {
        /// Number of chunks to retrieve (clamped to 1..=20)
        #[arg(short, default_value_t = DEFAULT_TOP_K)]
        k: usize,

        #[command(flatten)]
        chunking: ChunkingArgs,
    },
}

/// Chunking overrides; unset values come from the environment.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct ChunkingArgs {
    /// Maximum characters per chunk
    #[arg(long, value_parser = clap::value_parser!(u64).range(256..=5000))]
    pub chunk_size: Option<u64>,

    /// Characters shared by adjacent chunks
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=1000))]
    pub chunk_overlap: Option<u64>,
}

impl Cli {
    /// Apply the global overrides to `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.persist_dir {
            settings.persist_directory = dir.clone();
        }
        if let Some(name) = &self.collection {
            settings.collection_name = name.clone();
        }
    }
}
