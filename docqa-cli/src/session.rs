//! The collection, chain and settings one invocation works with.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use docqa_rag::{
    Answer, AnswerChain, Collection, IngestConfig, IngestReport, OpenAIChatProvider,
    OpenAIEmbeddingProvider, RecursiveChunker, Settings, SqliteVectorStore, clamp_top_k,
    ingest_paths,
};
use tracing::{debug, warn};

use crate::cli::ChunkingArgs;

/// Everything a command needs, opened once and passed explicitly.
pub struct Session {
    settings: Settings,
    collection: Collection,
    chain: AnswerChain,
}

/// What `ask` produced.
#[derive(Debug)]
pub enum AskOutcome {
    /// The collection holds no chunks; the model was not called.
    NothingIndexed,
    /// The generated answer and its sources.
    Answered(Answer),
}

impl Session {
    /// Open the persistent store and build the OpenAI providers from `settings`.
    pub async fn open(settings: Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbeddingProvider::from_settings(&settings)?);
        let chat = Arc::new(OpenAIChatProvider::from_settings(&settings)?);
        let store = Arc::new(SqliteVectorStore::open(&settings.persist_directory).await?);
        let collection =
            Collection::initialize(store, embedder, settings.collection_name.clone()).await?;
        debug!(?settings, "session opened");
        Ok(Self::from_parts(settings, collection, AnswerChain::new(chat)))
    }

    /// Assemble a session from already-built parts.
    pub fn from_parts(settings: Settings, collection: Collection, chain: AnswerChain) -> Self {
        Self { settings, collection, chain }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Chunking parameters from settings with `overrides` applied.
    pub fn ingest_config(&self, overrides: ChunkingArgs) -> Result<IngestConfig> {
        let defaults = &self.settings.ingest;
        let config = IngestConfig::builder()
            .max_chunk_size(overrides.chunk_size.map_or(defaults.max_chunk_size, |n| n as usize))
            .chunk_overlap(overrides.chunk_overlap.map_or(defaults.chunk_overlap, |n| n as usize))
            .build()?;
        Ok(config)
    }

    /// Load, chunk and add `files`.
    pub async fn ingest(&self, files: &[PathBuf], config: &IngestConfig) -> Result<IngestReport> {
        let chunker = RecursiveChunker::from_config(config);
        let report = ingest_paths(&self.collection, &chunker, files)
            .await
            .context("Ingestion failed")?;
        if report.loaded.is_empty() {
            warn!(files = files.len(), "no file could be loaded");
        }
        Ok(report)
    }

    /// Answer `question` from the `k` nearest chunks; `k` is clamped to 1..=20.
    pub async fn ask(&self, question: &str, k: usize) -> Result<AskOutcome> {
        if self.collection.count().await? == 0 {
            return Ok(AskOutcome::NothingIndexed);
        }
        let answer = self
            .chain
            .answer(question, &self.collection, clamp_top_k(k))
            .await
            .context("Query failed")?;
        Ok(AskOutcome::Answered(answer))
    }

    /// Drop every chunk in the collection.
    pub async fn clear(&self) -> Result<()> {
        self.collection.clear().await?;
        Ok(())
    }
}
