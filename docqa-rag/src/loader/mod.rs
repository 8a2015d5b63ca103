//! Loading files into [`Document`]s.
//!
//! [`FileKind::from_path`] picks an extractor from the file extension and
//! [`FileKind::extract`] runs it. [`load_documents`] loads a batch of paths,
//! logging and skipping any path that fails so that one bad file never
//! stops the rest of the batch.
//!
//! | extension                          | kind                         | documents produced              |
//! |------------------------------------|------------------------------|---------------------------------|
//! | `txt`, `md`                        | [`FileKind::PlainText`]      | one                             |
//! | `csv`                              | [`FileKind::Csv`]            | one per row                     |
//! | `xls`, `xlsx`, `xlsm`, `xlsb`, `ods` | [`FileKind::Spreadsheet`]  | one for the whole workbook      |
//! | `pdf`, `docx`, `pptx`, `html`, `htm` | [`FileKind::StructuredDocument`] | per page / slide, or one   |
//! | anything else                      | [`FileKind::Unknown`]        | read as plain text              |

mod structured;
mod tabular;
mod text;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Page-oriented or markup formats handled by the structured extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    /// Portable Document Format.
    Pdf,
    /// Word (Office Open XML) document.
    Docx,
    /// PowerPoint (Office Open XML) presentation.
    Pptx,
    /// HTML page.
    Html,
}

/// The extractor selected for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// UTF-8 text or markdown.
    PlainText,
    /// Comma-separated values, one document per row.
    Csv,
    /// Excel or OpenDocument workbook, one combined document.
    Spreadsheet,
    /// PDF, Word, PowerPoint or HTML.
    StructuredDocument(StructuredFormat),
    /// Unrecognized extension (lower-cased, possibly empty); read as plain text.
    Unknown(String),
}

impl FileKind {
    /// Select an extractor from the path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" => Self::PlainText,
            "csv" => Self::Csv,
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Self::Spreadsheet,
            "pdf" => Self::StructuredDocument(StructuredFormat::Pdf),
            "docx" => Self::StructuredDocument(StructuredFormat::Docx),
            "pptx" => Self::StructuredDocument(StructuredFormat::Pptx),
            "html" | "htm" => Self::StructuredDocument(StructuredFormat::Html),
            _ => Self::Unknown(extension),
        }
    }

    /// Extract documents from `path`.
    ///
    /// Documents whose text is blank are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] if the file cannot be read or parsed,
    /// or if it contains no extractable text.
    pub fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let documents = match self {
            Self::PlainText => text::extract(path)?,
            Self::Csv => tabular::extract_csv(path)?,
            Self::Spreadsheet => tabular::extract_spreadsheet(path)?,
            Self::StructuredDocument(format) => structured::extract(*format, path)?,
            Self::Unknown(extension) => {
                warn!(
                    path = %path.display(),
                    extension = %extension,
                    "unsupported file extension, falling back to plain text"
                );
                text::extract(path)?
            }
        };

        let documents: Vec<Document> =
            documents.into_iter().filter(|d| !d.text.trim().is_empty()).collect();
        if documents.is_empty() {
            return Err(RagError::load(path.display().to_string(), "no text could be extracted"));
        }
        Ok(documents)
    }
}

/// A path that could not be loaded, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    /// The path that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub error: RagError,
}

/// The outcome of loading a batch of paths.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Documents from every path that loaded, in input order.
    pub documents: Vec<Document>,
    /// Paths that loaded successfully.
    pub loaded: Vec<PathBuf>,
    /// Paths that were skipped.
    pub failures: Vec<LoadFailure>,
}

/// Load every path, skipping (and logging) the ones that fail.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut report = LoadReport::default();

    for path in paths {
        let path = path.as_ref();
        match FileKind::from_path(path).extract(path) {
            Ok(documents) => {
                info!(path = %path.display(), count = documents.len(), "loaded documents");
                report.documents.extend(documents);
                report.loaded.push(path.to_path_buf());
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load file");
                report.failures.push(LoadFailure { path: path.to_path_buf(), error: e });
            }
        }
    }

    report
}

/// Metadata every extractor starts from: `source` and `file_name`.
pub(crate) fn base_metadata(path: &Path) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), path.display().to_string());
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        metadata.insert("file_name".to_string(), name.to_string());
    }
    metadata
}

/// Build a document for `path`. `part` distinguishes several documents from one file.
pub(crate) fn make_document(
    path: &Path,
    text: String,
    part: Option<(&str, usize)>,
) -> Document {
    let mut metadata = base_metadata(path);
    let source = path.display().to_string();
    let id = match part {
        Some((key, value)) => {
            metadata.insert(key.to_string(), value.to_string());
            format!("{source}#{key}={value}")
        }
        None => source,
    };
    Document { id, text, metadata, source_uri: Some(path.display().to_string()) }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| RagError::load(path.display().to_string(), e.to_string()))
}
