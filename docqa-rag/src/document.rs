//! Data types for documents, chunks, search results and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Text extracted from a source file, plus metadata describing where it came from.
///
/// The loader always sets `source` (the file path) and `file_name` in `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier for the document, derived from the source path.
    pub id: String,
    /// The extracted text.
    pub text: String,
    /// Key-value metadata such as `source`, `page` or `row`.
    pub metadata: HashMap<String, String>,
    /// Where the text came from, when it is not a local file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

/// A window of a [`Document`]'s text, the unit that gets embedded and stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk within its collection.
    pub id: String,
    /// Chunk text, at most the configured chunk size in characters.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until ingestion embeds it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus `chunk_index` and `start_index`.
    pub metadata: HashMap<String, String>,
    /// Id of the [`Document`] this chunk was cut from.
    pub document_id: String,
}

/// A stored [`Chunk`] returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching record.
    pub chunk: Chunk,
    /// Cosine similarity to the query, in `[-1, 1]`; higher is closer.
    pub score: f32,
}

/// The generated answer to a question and the chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Text returned by the completion model.
    pub text: String,
    /// The retrieved chunks that were placed in the prompt, most relevant first.
    pub sources: Vec<SearchResult>,
}
