//! A named collection bound to its store and embedding provider.
//!
//! [`Collection`] is the handle every ingest and query goes through: it embeds
//! chunk text on the way in, embeds the query on the way out, and delegates
//! storage and similarity search to a [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{Collection, Retriever, SqliteVectorStore};
//!
//! let store = Arc::new(SqliteVectorStore::open("./chroma_db").await?);
//! let collection = Collection::initialize(store, embedder, "docs_collection").await?;
//! collection.add(chunks, &ids).await?;
//! let hits = collection.retrieve("what is the refund policy?", 4).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Anything that can return the chunks most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `k` results, most relevant first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;
}

/// A vector-store collection with the embedding provider used to fill it.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    name: String,
}

impl Collection {
    /// Open `name` in `store`, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreInitError`] if the collection cannot be created.
    pub async fn initialize(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RagError::ValidationError("collection name must not be empty".into()));
        }

        store.create_collection(&name, embedder.dimensions()).await.map_err(|e| {
            error!(collection = %name, error = %e, "failed to create collection");
            RagError::StoreInitError { location: format!("collection '{name}'"), message: e.to_string() }
        })?;

        debug!(collection = %name, embedder = embedder.name(), "collection ready");
        Ok(Self { store, embedder, name })
    }

    /// Name of the collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Embed `chunks` and store them under `ids`, replacing any records with the same id.
    ///
    /// The whole batch is embedded before anything is written, so an embedding
    /// failure leaves the collection untouched. Returns the number of chunks stored.
    ///
    /// # Errors
    ///
    /// - [`RagError::ValidationError`] if `ids` and `chunks` differ in length
    ///   or an id is empty.
    /// - [`RagError::EmbeddingError`] if embedding fails.
    /// - [`RagError::VectorStoreError`] if the write fails.
    pub async fn add(&self, mut chunks: Vec<Chunk>, ids: &[String]) -> Result<usize> {
        if chunks.len() != ids.len() {
            return Err(RagError::ValidationError(format!(
                "got {} chunks but {} ids",
                chunks.len(),
                ids.len()
            )));
        }
        if ids.iter().any(|id| id.is_empty()) {
            return Err(RagError::ValidationError("chunk ids must not be empty".into()));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "embedding failed during add");
            e
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedder.name().to_string(),
                message: format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            });
        }

        for ((chunk, id), embedding) in chunks.iter_mut().zip(ids).zip(embeddings) {
            chunk.id = id.clone();
            chunk.embedding = embedding;
        }

        self.store.upsert(&self.name, &chunks).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "upsert failed during add");
            e
        })?;

        info!(collection = %self.name, chunk_count = chunks.len(), "added chunks");
        Ok(chunks.len())
    }

    /// Remove every record. The collection stays usable for later adds.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete_collection(&self.name).await?;
        self.store.create_collection(&self.name, self.embedder.dimensions()).await?;
        info!(collection = %self.name, "cleared collection");
        Ok(())
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize> {
        self.store.count(&self.name).await
    }
}

#[async_trait]
impl Retriever for Collection {
    /// Embed `query` and return the `k` nearest records by descending score.
    ///
    /// An empty collection yields an empty list.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagError::ValidationError("query must not be empty".into()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&self.name, &embedding, k).await?;

        debug!(collection = %self.name, k, result_count = results.len(), "retrieved chunks");
        Ok(results)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::inmemory::InMemoryVectorStore;

    /// Embeds each text as `[len, 1.0]`; fails once `fail_after` calls have been made.
    struct LengthEmbedder {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl LengthEmbedder {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), fail_after: usize::MAX }
        }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), fail_after: 0 }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                return Err(RagError::EmbeddingError {
                    provider: "test".into(),
                    message: "quota exceeded".into(),
                });
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk {
            id: String::new(),
            text: text.to_string(),
            embedding: Vec::new(),
            metadata: HashMap::new(),
            document_id: "doc".to_string(),
        }
    }

    async fn collection(embedder: LengthEmbedder) -> Collection {
        Collection::initialize(Arc::new(InMemoryVectorStore::new()), Arc::new(embedder), "docs")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_assigns_ids_and_embeddings() {
        let collection = collection(LengthEmbedder::new()).await;
        let stored = collection
            .add(vec![chunk("a"), chunk("bbbb")], &["id-1".to_string(), "id-2".to_string()])
            .await
            .unwrap();
        assert_eq!(stored, 2);
        assert_eq!(collection.count().await.unwrap(), 2);

        let hits = collection.retrieve("bbbb", 1).await.unwrap();
        assert_eq!(hits[0].chunk.id, "id-2");
        assert_eq!(hits[0].chunk.embedding, vec![4.0, 1.0]);
    }

    #[tokio::test]
    async fn add_rejects_mismatched_ids() {
        let collection = collection(LengthEmbedder::new()).await;
        let result = collection.add(vec![chunk("a"), chunk("b")], &["only-one".to_string()]).await;
        assert!(matches!(result, Err(RagError::ValidationError(_))));
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() {
        let collection = collection(LengthEmbedder::failing()).await;
        let result = collection.add(vec![chunk("a")], &["id".to_string()]).await;
        assert!(matches!(result, Err(RagError::EmbeddingError { .. })));
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_empties_but_keeps_collection_usable() {
        let collection = collection(LengthEmbedder::new()).await;
        collection.add(vec![chunk("a")], &["id".to_string()]).await.unwrap();

        collection.clear().await.unwrap();
        assert!(collection.retrieve("a", 4).await.unwrap().is_empty());

        collection.add(vec![chunk("b")], &["id2".to_string()]).await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let collection = collection(LengthEmbedder::new()).await;
        assert!(matches!(
            collection.retrieve("   ", 4).await,
            Err(RagError::ValidationError(_))
        ));
    }
}
