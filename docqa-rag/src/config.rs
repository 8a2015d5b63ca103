//! Chunking and retrieval parameters.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RagError, Result};

/// Smallest and largest `k` a query may ask for.
pub const TOP_K_RANGE: std::ops::RangeInclusive<usize> = 1..=20;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Configuration for splitting documents into chunks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Maximum chunk size in characters.
    pub max_chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { max_chunk_size: 1000, chunk_overlap: 200 }
    }
}

impl IngestConfig {
    /// Create a new builder for constructing an [`IngestConfig`].
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

/// Builder for constructing an [`IngestConfig`].
#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.max_chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Build the [`IngestConfig`].
    ///
    /// An overlap that is not smaller than the chunk size is accepted with a
    /// warning; the splitter still terminates but adjacent chunks then share
    /// as much text as fits.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] if `max_chunk_size == 0`.
    pub fn build(self) -> Result<IngestConfig> {
        if self.config.max_chunk_size == 0 {
            return Err(RagError::ValidationError(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.config.chunk_overlap >= self.config.max_chunk_size {
            warn!(
                max_chunk_size = self.config.max_chunk_size,
                chunk_overlap = self.config.chunk_overlap,
                "chunk_overlap is not smaller than max_chunk_size"
            );
        }
        Ok(self.config)
    }
}

/// Clamp a requested result count into [`TOP_K_RANGE`].
pub fn clamp_top_k(k: usize) -> usize {
    k.clamp(*TOP_K_RANGE.start(), *TOP_K_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_original_settings() {
        let config = IngestConfig::default();
        assert_eq!(config.max_chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
    }

    #[test]
    fn builder_rejects_zero_chunk_size() {
        let result = IngestConfig::builder().max_chunk_size(0).build();
        assert!(matches!(result, Err(RagError::ValidationError(_))));
    }

    #[test]
    fn builder_accepts_overlap_not_below_size() {
        let config = IngestConfig::builder().max_chunk_size(100).chunk_overlap(100).build().unwrap();
        assert_eq!(config.chunk_overlap, 100);
    }

    #[test]
    fn top_k_is_clamped() {
        assert_eq!(clamp_top_k(0), 1);
        assert_eq!(clamp_top_k(4), 4);
        assert_eq!(clamp_top_k(50), 20);
    }
}
