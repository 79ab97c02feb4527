//! The cached unit: one extraction result owned by one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Extracted document text plus metadata.
///
/// Immutable once created: a rebuild produces a new value that replaces the
/// old one wholesale. `total_length` is the byte length of `document_text`
/// and is checked again whenever a record is decoded from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContext")]
pub struct DocumentContext {
    document_text: String,
    document_url: String,
    processed_at: DateTime<Utc>,
    total_length: usize,
}

impl DocumentContext {
    /// Builds a context stamped with the current time.
    pub fn new(document_text: impl Into<String>, document_url: impl Into<String>) -> Self {
        Self::with_timestamp(document_text, document_url, Utc::now())
    }

    pub fn with_timestamp(
        document_text: impl Into<String>,
        document_url: impl Into<String>,
        processed_at: DateTime<Utc>,
    ) -> Self {
        let document_text = document_text.into();
        Self {
            total_length: document_text.len(),
            document_text,
            document_url: document_url.into(),
            processed_at,
        }
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }
}

/// Wire shape; converted through `TryFrom` so the length invariant holds.
#[derive(Deserialize)]
struct RawContext {
    document_text: String,
    document_url: String,
    processed_at: DateTime<Utc>,
    total_length: usize,
}

impl TryFrom<RawContext> for DocumentContext {
    type Error = StoreError;

    fn try_from(raw: RawContext) -> Result<Self, Self::Error> {
        if raw.total_length != raw.document_text.len() {
            return Err(StoreError::Corrupt(format!(
                "total_length {} does not match text length {}",
                raw.total_length,
                raw.document_text.len()
            )));
        }
        Ok(Self {
            document_text: raw.document_text,
            document_url: raw.document_url,
            processed_at: raw.processed_at,
            total_length: raw.total_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_stored_text() {
        let ctx = DocumentContext::new("Matrícula\n\nHorarios", "https://x/doc.pdf");
        assert_eq!(ctx.total_length(), "Matrícula\n\nHorarios".len());
    }

    #[test]
    fn decoding_rejects_mismatched_length() {
        let json = r#"{"document_text":"abc","document_url":"u","processed_at":"2025-01-01T00:00:00Z","total_length":7}"#;
        assert!(serde_json::from_str::<DocumentContext>(json).is_err());

        let ok = r#"{"document_text":"abc","document_url":"u","processed_at":"2025-01-01T00:00:00Z","total_length":3}"#;
        let ctx: DocumentContext = serde_json::from_str(ok).unwrap();
        assert_eq!(ctx.document_text(), "abc");
    }
}
