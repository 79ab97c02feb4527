use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildFailure>;

/// Why a context could not be built from the document URL.
#[derive(Debug, Error)]
pub enum BuildFailure {
    /// Unreachable host, transport failure, or non-success status.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// The response does not declare a PDF content type.
    #[error("unexpected content type `{found}` (expected pdf)")]
    InvalidContentType { found: String },

    /// Writing the temporary file or extracting text failed.
    #[error("text extraction failed: {0}")]
    Extraction(String),
}

/// Flat classification of [`BuildFailure`], for logs and audit metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildFailureKind {
    FetchError,
    InvalidContentType,
    ExtractionError,
}

impl BuildFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildFailureKind::FetchError => "FetchError",
            BuildFailureKind::InvalidContentType => "InvalidContentType",
            BuildFailureKind::ExtractionError => "ExtractionError",
        }
    }
}

impl BuildFailure {
    pub fn kind(&self) -> BuildFailureKind {
        match self {
            BuildFailure::Fetch { .. } => BuildFailureKind::FetchError,
            BuildFailure::InvalidContentType { .. } => BuildFailureKind::InvalidContentType,
            BuildFailure::Extraction(_) => BuildFailureKind::ExtractionError,
        }
    }
}

impl From<std::io::Error> for BuildFailure {
    fn from(e: std::io::Error) -> Self {
        BuildFailure::Extraction(format!("I/O error: {e}"))
    }
}

impl From<tokio::task::JoinError> for BuildFailure {
    fn from(e: tokio::task::JoinError) -> Self {
        BuildFailure::Extraction(format!("extraction task failed: {e}"))
    }
}
