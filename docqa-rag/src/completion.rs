//! Chat-completion provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// Sends a rendered prompt to a language model and returns its reply.
///
/// Implementations must not retry; a failed call surfaces as
/// [`RagError::CompletionError`](crate::RagError::CompletionError).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt` with the given sampling temperature.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Model name used in logs.
    fn model(&self) -> &str;
}
