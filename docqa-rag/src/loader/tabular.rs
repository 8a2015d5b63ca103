//! CSV files and spreadsheets.

use std::path::Path;

#[cfg(feature = "spreadsheet")]
use calamine::Reader;

use super::make_document;
use crate::document::Document;
use crate::error::{RagError, Result};

/// One document per CSV row, rendered as `header: value` lines.
///
/// Rows carry a zero-based `row` metadata entry.
pub(super) fn extract_csv(path: &Path) -> Result<Vec<Document>> {
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| RagError::load(&source, e.to_string()))?;

    let headers = reader.headers().map_err(|e| RagError::load(&source, e.to_string()))?.clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RagError::load(&source, format!("row {row}: {e}")))?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        documents.push(make_document(path, text, Some(("row", row))));
    }

    Ok(documents)
}

/// All sheets of a workbook combined into one document.
///
/// Each sheet starts with a `Sheet: <name>` line followed by one line per
/// non-empty row, cells separated by ` | `.
#[cfg(feature = "spreadsheet")]
pub(super) fn extract_spreadsheet(path: &Path) -> Result<Vec<Document>> {
    let source = path.display().to_string();
    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| RagError::load(&source, e.to_string()))?;

    let mut text = String::new();
    let sheet_names = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| RagError::load(&source, format!("sheet '{sheet_name}': {e}")))?;

        text.push_str(&format!("Sheet: {sheet_name}\n"));
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            text.push_str(&cells.join(" | "));
            text.push('\n');
        }
        text.push('\n');
    }

    let mut document = make_document(path, text.trim_end().to_string(), None);
    document.metadata.insert("sheets".to_string(), sheet_names.join(","));
    Ok(vec![document])
}

#[cfg(not(feature = "spreadsheet"))]
pub(super) fn extract_spreadsheet(path: &Path) -> Result<Vec<Document>> {
    Err(RagError::load(path.display().to_string(), "spreadsheet support was not compiled in"))
}
