//! Ingestion orchestrator: load → chunk → add.
//!
//! [`ingest_paths`] composes the loader, a [`Chunker`] and a [`Collection`].
//! Files that fail to load are reported and skipped; the rest are chunked,
//! given fresh UUIDs and added to the collection as one batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RecursiveChunker, ingest_paths};
//!
//! let chunker = RecursiveChunker::new(1000, 200);
//! let report = ingest_paths(&collection, &chunker, &["notes.txt", "data.csv"]).await?;
//! println!("{} chunks from {} files", report.chunk_count, report.loaded.len());
//! ```

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::chunking::{Chunker, chunk_documents};
use crate::collection::Collection;
use crate::error::{RagError, Result};
use crate::loader::{LoadFailure, load_documents};

/// What an ingest run did.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Files that loaded and were chunked.
    pub loaded: Vec<PathBuf>,
    /// Files that were skipped, with the reason.
    pub failures: Vec<LoadFailure>,
    /// Documents extracted from the loaded files.
    pub document_count: usize,
    /// Chunks added to the collection.
    pub chunk_count: usize,
}

/// Load `paths`, split them with `chunker`, and add every chunk to `collection`.
///
/// File extraction is blocking work and runs on tokio's blocking pool, so
/// the calling task's worker stays free while PDFs and workbooks are parsed.
///
/// # Errors
///
/// Per-file load errors are collected in [`IngestReport::failures`] and never
/// returned. Embedding or store failures abort the batch and are returned as
/// is; in that case nothing from the batch has been written.
pub async fn ingest_paths<P: AsRef<Path>>(
    collection: &Collection,
    chunker: &dyn Chunker,
    paths: &[P],
) -> Result<IngestReport> {
    let owned: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    let file_count = owned.len();
    let loaded = tokio::task::spawn_blocking(move || load_documents(&owned)).await.map_err(|e| {
        RagError::load(format!("{file_count} file(s)"), format!("loader task failed: {e}"))
    })?;
    for failure in &loaded.failures {
        warn!(path = %failure.path.display(), error = %failure.error, "skipping file");
    }

    let chunks = chunk_documents(chunker, &loaded.documents);
    let ids: Vec<String> = chunks.iter().map(|_| Uuid::new_v4().to_string()).collect();
    let chunk_count = collection.add(chunks, &ids).await?;

    info!(
        collection = collection.name(),
        files = loaded.loaded.len(),
        skipped = loaded.failures.len(),
        chunk_count,
        "ingested files"
    );

    Ok(IngestReport {
        loaded: loaded.loaded,
        failures: loaded.failures,
        document_count: loaded.documents.len(),
        chunk_count,
    })
}
