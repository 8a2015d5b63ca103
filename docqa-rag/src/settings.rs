//! Application settings sourced from environment variables.
//!
//! Every setting has a default except `OPENAI_API_KEY`, which must be present
//! and non-blank. Loading fails before any client or store is constructed.

use std::path::PathBuf;

use crate::config::IngestConfig;
use crate::error::{RagError, Result};

/// Default chat-completion model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default directory holding the persistent collection.
pub const DEFAULT_PERSIST_DIRECTORY: &str = "./chroma_db";
/// Default collection name.
pub const DEFAULT_COLLECTION_NAME: &str = "docs_collection";

/// Resolved application settings.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// API key for the embedding and completion endpoints.
    pub openai_api_key: String,
    /// Chat-completion model name.
    pub openai_model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Vector size of the embedding model, when it is not a known OpenAI model.
    pub embedding_dimensions: Option<usize>,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Directory holding the persistent vector collection.
    pub persist_directory: PathBuf,
    /// Name of the collection inside the store.
    pub collection_name: String,
    /// Chunking parameters.
    pub ingest: IngestConfig,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"<redacted>")
            .field("openai_model", &self.openai_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("openai_base_url", &self.openai_base_url)
            .field("persist_directory", &self.persist_directory)
            .field("collection_name", &self.collection_name)
            .field("ingest", &self.ingest)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] if `OPENAI_API_KEY` is missing or
    /// blank, or if a numeric setting does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                RagError::ValidationError(
                    "OPENAI_API_KEY must be set in environment or .env file".to_string(),
                )
            })?;

        let string_or = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
        };

        let defaults = IngestConfig::default();
        let ingest = IngestConfig::builder()
            .max_chunk_size(parse_usize(&lookup, "MAX_CHUNK_SIZE", defaults.max_chunk_size)?)
            .chunk_overlap(parse_usize(&lookup, "CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .build()?;

        let embedding_dimensions = match lookup("EMBEDDING_DIMENSIONS") {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(RagError::ValidationError(format!(
                        "EMBEDDING_DIMENSIONS must be a positive integer, got '{raw}'"
                    )));
                }
            },
            _ => None,
        };

        Ok(Self {
            openai_api_key,
            openai_model: string_or("OPENAI_MODEL", DEFAULT_CHAT_MODEL),
            embedding_model: string_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            embedding_dimensions,
            openai_base_url: string_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            persist_directory: PathBuf::from(string_or(
                "CHROMA_PERSIST_DIRECTORY",
                DEFAULT_PERSIST_DIRECTORY,
            )),
            collection_name: string_or("CHROMA_COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
            ingest,
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            RagError::ValidationError(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(settings.openai_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.persist_directory, PathBuf::from(DEFAULT_PERSIST_DIRECTORY));
        assert_eq!(settings.collection_name, DEFAULT_COLLECTION_NAME);
        assert_eq!(settings.embedding_dimensions, None);
        assert_eq!(settings.ingest, IngestConfig::default());
    }

    #[test]
    fn missing_api_key_fails() {
        let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, RagError::ValidationError(ref m) if m.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn blank_api_key_fails() {
        let result = Settings::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")]));
        assert!(matches!(result, Err(RagError::ValidationError(_))));
    }

    #[test]
    fn overrides_are_read() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("CHROMA_COLLECTION_NAME", "manuals"),
            ("MAX_CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
        ]))
        .unwrap();
        assert_eq!(settings.openai_model, "gpt-4o");
        assert_eq!(settings.collection_name, "manuals");
        assert_eq!(settings.ingest.max_chunk_size, 500);
        assert_eq!(settings.ingest.chunk_overlap, 50);
    }

    #[test]
    fn unparsable_number_fails() {
        let result = Settings::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_CHUNK_SIZE", "big"),
        ]));
        assert!(matches!(result, Err(RagError::ValidationError(ref m)) if m.contains("MAX_CHUNK_SIZE")));
    }

    #[test]
    fn embedding_dimensions_must_be_positive() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("EMBEDDING_DIMENSIONS", "768"),
        ]))
        .unwrap();
        assert_eq!(settings.embedding_dimensions, Some(768));

        for bad in ["0", "-1", "wide"] {
            let result = Settings::from_lookup(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("EMBEDDING_DIMENSIONS", bad),
            ]));
            assert!(
                matches!(result, Err(RagError::ValidationError(ref m)) if m.contains("EMBEDDING_DIMENSIONS"))
            );
        }
    }

    #[test]
    fn debug_output_hides_key() {
        let settings = Settings::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }
}
