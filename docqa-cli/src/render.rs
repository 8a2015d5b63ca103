//! Plain-text output for the terminal.

use std::fmt::Write;

use docqa_rag::{Answer, IngestReport};

/// Longest source snippet shown, in characters.
pub const SNIPPET_CHARS: usize = 1000;

/// Cut `text` to `max` characters, appending `...` when anything was dropped.
pub fn truncate_snippet(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn ingest_summary(report: &IngestReport, collection: &str) -> String {
    let mut out = format!(
        "Ingested {} chunks from {} file(s) into '{collection}'",
        report.chunk_count,
        report.loaded.len()
    );
    for failure in &report.failures {
        let _ = write!(out, "\nSkipped {}: {}", failure.path.display(), failure.error);
    }
    out
}

/// The answer, then each source with its metadata and a snippet.
pub fn answer(answer: &Answer) -> String {
    let mut out = format!("Answer:\n{}\n", answer.text.trim());
    if answer.sources.is_empty() {
        return out;
    }

    out.push_str("\nSource documents (top results):");
    for (i, source) in answer.sources.iter().enumerate() {
        let chunk = &source.chunk;
        let mut metadata: Vec<_> = chunk.metadata.iter().collect();
        metadata.sort();
        let metadata = metadata
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");

        let _ = write!(
            out,
            "\n---\nSource {} (score {:.3}) {{{metadata}}}\n{}",
            i + 1,
            source.score,
            truncate_snippet(&chunk.text, SNIPPET_CHARS)
        );
    }
    out
}

pub const NOTHING_INDEXED: &str =
    "No documents indexed yet. Run `docqa ingest <FILES>` or `:ingest <FILES>` first.";
