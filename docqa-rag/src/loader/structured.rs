//! PDF, Word, PowerPoint and HTML extraction.
//!
//! Each format sits behind its own cargo feature (`pdf`, `office`, `html`).
//! A format compiled out fails to load with a [`RagError::LoadError`].

#[cfg(feature = "office")]
use std::io::Read;
use std::path::Path;
#[cfg(feature = "pdf")]
use std::sync::mpsc::{self, RecvTimeoutError};
#[cfg(feature = "pdf")]
use std::time::Duration;

#[cfg(feature = "office")]
use quick_xml::Reader;
#[cfg(feature = "office")]
use quick_xml::events::Event;
#[cfg(feature = "pdf")]
use tracing::{debug, error};

use super::{StructuredFormat, read_bytes};
#[cfg(any(feature = "pdf", feature = "office", feature = "html"))]
use super::make_document;
use crate::document::Document;
use crate::error::{RagError, Result};

/// How long a single PDF may take to extract.
#[cfg(feature = "pdf")]
pub(super) const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

pub(super) fn extract(format: StructuredFormat, path: &Path) -> Result<Vec<Document>> {
    let bytes = read_bytes(path)?;
    match format {
        #[cfg(feature = "pdf")]
        StructuredFormat::Pdf => extract_pdf(path, bytes, PDF_EXTRACT_TIMEOUT),
        #[cfg(feature = "office")]
        StructuredFormat::Docx => extract_docx(path, &bytes),
        #[cfg(feature = "office")]
        StructuredFormat::Pptx => extract_pptx(path, &bytes),
        #[cfg(feature = "html")]
        StructuredFormat::Html => Ok(vec![extract_html(path, &bytes)]),
        #[allow(unreachable_patterns)]
        other => Err(RagError::load(
            path.display().to_string(),
            format!("{other:?} support was not compiled in"),
        )),
    }
}

/// Why a job run under a deadline produced nothing.
#[cfg(feature = "pdf")]
#[derive(Debug, PartialEq, Eq)]
enum Interrupted {
    TimedOut(Duration),
    Panicked,
}

#[cfg(feature = "pdf")]
impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(after) => write!(f, "extraction timed out after {}s", after.as_secs_f32()),
            Self::Panicked => f.write_str("parser panicked"),
        }
    }
}

/// Run `job` on its own thread and wait at most `timeout` for its result.
///
/// A thread that overruns cannot be stopped; it is left to finish in the
/// background and its result is dropped.
#[cfg(feature = "pdf")]
fn run_with_deadline<T, F>(timeout: Duration, job: F) -> std::result::Result<T, Interrupted>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let _ = tx.send(job());
    });

    match rx.recv_timeout(timeout) {
        Ok(value) => {
            let _ = handle.join();
            Ok(value)
        }
        Err(RecvTimeoutError::Timeout) => Err(Interrupted::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            Err(Interrupted::Panicked)
        }
    }
}

/// One document per page that has text, tagged with its 1-based `page`.
/// A PDF with a single text page yields one untagged document.
///
/// pdf-extract hangs on some fonts and panics on some malformed files, so it
/// runs on a separate thread bounded by `timeout`.
#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path, bytes: Vec<u8>, timeout: Duration) -> Result<Vec<Document>> {
    let source = path.display().to_string();

    let extract = move || pdf_extract::extract_text_from_mem_by_pages(&bytes);
    let pages = run_with_deadline(timeout, extract)
        .map_err(|interrupted| {
            error!(path = %source, reason = %interrupted, "PDF extraction abandoned");
            RagError::load(&source, format!("PDF {interrupted}"))
        })?
        .map_err(|e| RagError::load(&source, e.to_string()))?;

    let pages: Vec<(usize, String)> = pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| (i + 1, text.replace('\0', "").trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .collect();
    debug!(path = %source, pages = pages.len(), "extracted PDF text");

    if pages.len() == 1 {
        return Ok(pages.into_iter().map(|(_, text)| make_document(path, text, None)).collect());
    }
    Ok(pages
        .into_iter()
        .map(|(number, text)| make_document(path, text, Some(("page", number))))
        .collect())
}

/// Paragraph text of a Word document, one paragraph per line.
#[cfg(feature = "office")]
fn extract_docx(path: &Path, bytes: &[u8]) -> Result<Vec<Document>> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| RagError::load(path.display().to_string(), e.to_string()))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(vec![make_document(path, text.trim().to_string(), None)])
}

/// One document per slide, in slide order. Slides without text are skipped.
#[cfg(feature = "office")]
fn extract_pptx(path: &Path, bytes: &[u8]) -> Result<Vec<Document>> {
    let source = path.display().to_string();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| RagError::load(&source, e.to_string()))?;

    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?;
            Some((number.parse().ok()?, name.to_string()))
        })
        .collect();
    slides.sort();

    let mut documents = Vec::new();
    for (number, name) in slides {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|e| RagError::load(&source, e.to_string()))?
            .read_to_string(&mut xml)
            .map_err(|e| RagError::load(&source, format!("{name}: {e}")))?;

        let slide_text = slide_text(&xml);
        if !slide_text.is_empty() {
            documents.push(make_document(path, slide_text, Some(("slide", number))));
        }
    }

    Ok(documents)
}

/// Collect `<a:t>` runs, one line per `<a:p>` paragraph.
#[cfg(feature = "office")]
fn slide_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                if let Ok(t) = e.unescape() {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(t.trim());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if !line.trim().is_empty() => lines.push(std::mem::take(&mut line)),
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

/// Elements whose text is never rendered.
#[cfg(feature = "html")]
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible body text of an HTML page. The `<title>` goes into metadata.
#[cfg(feature = "html")]
fn extract_html(path: &Path, bytes: &[u8]) -> Document {
    let html = String::from_utf8_lossy(bytes);
    let page = scraper::Html::parse_document(&html);

    let title = scraper::Selector::parse("title")
        .ok()
        .and_then(|selector| page.select(&selector).next())
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let text = scraper::Selector::parse("body")
        .ok()
        .and_then(|selector| page.select(&selector).next())
        .map(visible_text)
        .unwrap_or_default();

    let mut document = make_document(path, text, None);
    if let Some(title) = title {
        document.metadata.insert("title".to_string(), title);
    }
    document
}

/// Text nodes under `root` that are not inside a hidden element, space-joined.
#[cfg(feature = "html")]
fn visible_text(root: scraper::ElementRef<'_>) -> String {
    root.descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            })
        })
        .map(|(_, text)| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
