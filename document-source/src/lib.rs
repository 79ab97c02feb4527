//! Document source: fetch the fixed PDF over HTTP and extract its text.
//!
//! - `GET url` with a bounded timeout (30 s by default); non-2xx is a fetch error.
//! - The declared `Content-Type` must contain `pdf` (case-insensitive).
//! - The body goes to a temporary file that is removed whatever happens,
//!   and text extraction runs on the blocking pool.

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use context_store::DocumentContext;
use reqwest::header::CONTENT_TYPE;
use tracing::{error, info, instrument};

pub mod errors;
pub mod extract;

pub use errors::{BuildFailure, BuildFailureKind};
pub use extract::{PdfTextExtractor, TextExtractor};

use errors::Result;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds a fresh [`DocumentContext`] for a document URL.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn build_context(&self, url: &str) -> Result<DocumentContext>;
}

/// HTTP + PDF implementation of [`ContextSource`].
pub struct HttpDocumentSource {
    client: reqwest::Client,
    extractor: Arc<dyn TextExtractor>,
    temp_dir: Option<PathBuf>,
}

impl HttpDocumentSource {
    /// Source with the given fetch timeout and the `pdf-extract` extractor.
    ///
    /// # Errors
    /// [`BuildFailure::Fetch`] if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_extractor(timeout, Arc::new(PdfTextExtractor))
    }

    pub fn with_extractor(timeout: Duration, extractor: Arc<dyn TextExtractor>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BuildFailure::Fetch {
                url: String::new(),
                status: None,
                reason: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            extractor,
            temp_dir: None,
        })
    }

    /// Puts temporary files under `dir` instead of the system temp directory.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_err = |status: Option<u16>, reason: String| BuildFailure::Fetch {
            url: url.to_string(),
            status,
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            error!(%status, url, "document download failed");
            return Err(fetch_err(Some(status.as_u16()), format!("HTTP {status}")));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_ascii_lowercase().contains("pdf") {
            error!(%content_type, url, "document is not a PDF");
            return Err(BuildFailure::InvalidContentType {
                found: content_type,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| fetch_err(Some(status.as_u16()), format!("reading body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ContextSource for HttpDocumentSource {
    #[instrument(skip(self), fields(url = %url))]
    async fn build_context(&self, url: &str) -> Result<DocumentContext> {
        let started = Instant::now();
        let bytes = self.fetch_pdf(url).await?;
        let downloaded = bytes.len();

        let extractor = self.extractor.clone();
        let dir = self.temp_dir.clone();
        let text = tokio::task::spawn_blocking(move || {
            extract::extract_scoped(extractor.as_ref(), &bytes, dir.as_deref())
        })
        .await??;

        let ctx = DocumentContext::new(text, url);
        info!(
            bytes = downloaded,
            text_length = ctx.total_length(),
            latency_ms = started.elapsed().as_millis(),
            "document context built"
        );
        Ok(ctx)
    }
}
