//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text on a list of separators ordered from coarse to fine
//! (paragraphs, lines, words, then single characters) and merges the pieces
//! back into windows of at most `chunk_size` characters, carrying up to
//! `chunk_overlap` characters of trailing context into the next window.
//!
//! Sizes are measured in Unicode scalar values, never bytes.

use std::collections::VecDeque;

use crate::config::IngestConfig;
use crate::document::{Chunk, Document};

/// Separators tried by [`RecursiveChunker`] by default, coarsest first.
///
/// The empty separator means "cut between any two characters".
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later during ingestion.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → words → characters.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk
/// inherits the parent document's metadata plus `chunk_index` and
/// `start_index` (the character offset of the chunk in the document text).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` using [`DEFAULT_SEPARATORS`].
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker from an [`IngestConfig`].
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.max_chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list. Separators are tried in order.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Split raw text into chunk strings without building [`Chunk`]s.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Use the first separator that occurs in the text; keep the finer
        // ones for pieces that are still too long.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for split in splits {
            if char_len(split) < self.chunk_size {
                fitting.push(split);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge_splits(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                // Nothing finer to cut on: the piece stays oversized.
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_recursive(split, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_splits(&fitting, separator));
        }

        chunks
    }

    /// Merge pieces into windows no longer than `chunk_size`, keeping a tail
    /// of at most `chunk_overlap` characters from each emitted window.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                if let Some(text) = join_window(&window, separator) {
                    merged.push(text);
                }
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    let dropped = char_len(front) + if window.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(dropped);
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { separator_len } else { 0 };
        }

        if let Some(text) = join_window(&window, separator) {
            merged.push(text);
        }

        merged
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let text = &document.text;
        let mut previous_start: Option<usize> = None;

        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk_text)| {
                let search_from = previous_start
                    .map(|start| next_char_boundary(text, start))
                    .unwrap_or(0);
                let byte_start = text[search_from..]
                    .find(chunk_text.as_str())
                    .map(|pos| search_from + pos)
                    .or_else(|| text.find(chunk_text.as_str()))
                    .unwrap_or(search_from);
                previous_start = Some(byte_start);

                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                metadata.insert(
                    "start_index".to_string(),
                    text[..byte_start].chars().count().to_string(),
                );

                Chunk {
                    id: format!("{}_{i}", document.id),
                    text: chunk_text,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

/// Split every document and concatenate the chunks, preserving order.
pub fn chunk_documents(chunker: &dyn Chunker, documents: &[Document]) -> Vec<Chunk> {
    documents.iter().flat_map(|document| chunker.chunk(document)).collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_window(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Byte index of the character after the one starting at `index`.
fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..].chars().next().map(|c| index + c.len_utf8()).unwrap_or(text.len())
}
