//! Embedding provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into vectors for similarity search.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) embeds one
/// text at a time and stops at the first failure, so callers never see a
/// partially embedded batch.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning vectors in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Length of the vectors this provider returns.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "embedding"
    }
}
