//! Text extraction from a document on disk.

use std::{io::Write, path::Path};

use tracing::{debug, warn};

use crate::errors::{BuildFailure, Result};

/// Converts a document file into plain text. Blocking; run it off the runtime.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// `pdf-extract` backed extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let text = pdf_extract::extract_text(path)
            .map_err(|e| BuildFailure::Extraction(format!("pdf-extract: {e}")))?;
        if text.trim().is_empty() {
            return Err(BuildFailure::Extraction(
                "document contains no extractable text".into(),
            ));
        }
        Ok(text)
    }
}

/// Writes `bytes` to a temporary `.pdf` file, runs `extractor` on it, and
/// deletes the file whatever the outcome.
///
/// `dir` overrides the system temp directory.
pub fn extract_scoped(
    extractor: &dyn TextExtractor,
    bytes: &[u8],
    dir: Option<&Path>,
) -> Result<String> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("temp_").suffix(".pdf");
    let mut tmp = match dir {
        Some(d) => builder.tempfile_in(d)?,
        None => builder.tempfile()?,
    };
    debug!(path = %tmp.path().display(), bytes = bytes.len(), "writing temporary document");

    let written = tmp.write_all(bytes).and_then(|_| tmp.flush());
    let result = match written {
        Ok(()) => extractor.extract(tmp.path()),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = tmp.close() {
        warn!(error = %e, "failed to delete temporary document");
    }
    result
}
