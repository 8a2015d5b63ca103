//! Plain text and markdown.

use std::path::Path;

use super::{make_document, read_bytes};
use crate::document::Document;
use crate::error::{RagError, Result};

/// Read the whole file as one UTF-8 document. Invalid UTF-8 is an error.
pub(super) fn extract(path: &Path) -> Result<Vec<Document>> {
    let bytes = read_bytes(path)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        RagError::load(path.display().to_string(), format!("file is not valid UTF-8: {e}"))
    })?;
    Ok(vec![make_document(path, text, None)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();

        assert!(matches!(extract(&path), Err(RagError::LoadError { .. })));
    }

    #[test]
    fn markdown_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.md");
        std::fs::write(&path, "# Title\n\nBody").unwrap();

        let documents = extract(&path).unwrap();
        assert_eq!(documents[0].text, "# Title\n\nBody");
        assert_eq!(documents[0].id, path.display().to_string());
    }
}
