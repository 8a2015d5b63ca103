//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// Backends hold named collections. Searching or counting a collection that
/// does not exist yields an empty result rather than an error, so a cleared
/// collection behaves like an empty one.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{SqliteVectorStore, VectorStore};
///
/// let store = SqliteVectorStore::open("./chroma_db").await?;
/// store.create_collection("docs", 1536).await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query_embedding, 4).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its records.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace chunks by id. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, by descending score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of records in the collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Cosine similarity of two vectors; 0.0 if either has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Sort by descending score and keep the first `top_k`.
pub(crate) fn rank(mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    results
}
