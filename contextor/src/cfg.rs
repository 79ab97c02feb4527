//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use document_source::DEFAULT_FETCH_TIMEOUT;
use serde::Serialize;

use crate::{error::ContextorError, prompt::Persona};

pub const DEFAULT_DOCUMENT_URL: &str =
    "https://www.itca.edu.sv/wp-content/uploads/2024/10/GuiaEstudiantil2025_compressed.pdf";
pub const DEFAULT_DOCUMENT_TITLE: &str = "Guía Estudiantil ITCA-FEPADE 2025";
pub const DEFAULT_INSTITUTION: &str = "ITCA-FEPADE";
pub const DEFAULT_RELEVANCE_BUDGET: usize = 30_000;
pub const DEFAULT_CHUNK_MAX_CHARS: usize = 15_000;

/// How much of the document goes into the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Keyword-scored excerpt within the relevance budget.
    Relevance,
    /// The whole document text.
    FullDocument,
    /// Sequential scan of fixed-size chunks until one yields an answer.
    ChunkScan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Relevance => "relevance",
            Strategy::FullDocument => "full_document",
            Strategy::ChunkScan => "chunk_scan",
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = ContextorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "relevance" => Ok(Strategy::Relevance),
            "full_document" | "full" => Ok(Strategy::FullDocument),
            "chunk_scan" | "chunks" => Ok(Strategy::ChunkScan),
            other => Err(ContextorError::Config(format!(
                "unsupported CONTEXT_STRATEGY `{other}`"
            ))),
        }
    }
}

/// Config bag for the orchestrator. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    pub app_env: String,
    pub document_url: String,
    pub document_title: String,
    pub institution: String,
    pub fetch_timeout: Duration,
    pub strategy: Strategy,
    pub relevance_budget: usize,
    pub chunk_max_chars: usize,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            app_env: "local".into(),
            document_url: DEFAULT_DOCUMENT_URL.into(),
            document_title: DEFAULT_DOCUMENT_TITLE.into(),
            institution: DEFAULT_INSTITUTION.into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            strategy: Strategy::Relevance,
            relevance_budget: DEFAULT_RELEVANCE_BUDGET,
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
        }
    }
}

impl ContextorConfig {
    /// Reads `APP_ENV`, `DOCUMENT_URL`, `DOCUMENT_TITLE`, `INSTITUTION_NAME`,
    /// `DOCUMENT_FETCH_TIMEOUT_SECS`, `CONTEXT_STRATEGY`, `RELEVANCE_BUDGET_CHARS`
    /// and `CHUNK_MAX_CHARS`.
    ///
    /// # Errors
    /// [`ContextorError::Config`] for an unknown strategy or a zero size/timeout.
    pub fn from_env() -> Result<Self, ContextorError> {
        let dflt = Self::default();
        let cfg = Self {
            app_env: env("APP_ENV", &dflt.app_env),
            document_url: env("DOCUMENT_URL", &dflt.document_url),
            document_title: env("DOCUMENT_TITLE", &dflt.document_title),
            institution: env("INSTITUTION_NAME", &dflt.institution),
            fetch_timeout: Duration::from_secs(parse(
                "DOCUMENT_FETCH_TIMEOUT_SECS",
                dflt.fetch_timeout.as_secs(),
            )),
            strategy: env("CONTEXT_STRATEGY", "relevance").parse()?,
            relevance_budget: parse("RELEVANCE_BUDGET_CHARS", dflt.relevance_budget),
            chunk_max_chars: parse("CHUNK_MAX_CHARS", dflt.chunk_max_chars),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if !self.document_url.starts_with("http://") && !self.document_url.starts_with("https://") {
            return Err(ContextorError::Config(
                "DOCUMENT_URL must start with http:// or https://".into(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ContextorError::Config(
                "DOCUMENT_FETCH_TIMEOUT_SECS must be > 0".into(),
            ));
        }
        if self.relevance_budget == 0 {
            return Err(ContextorError::Config(
                "RELEVANCE_BUDGET_CHARS must be > 0".into(),
            ));
        }
        if self.chunk_max_chars == 0 {
            return Err(ContextorError::Config("CHUNK_MAX_CHARS must be > 0".into()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn persona(&self) -> Persona {
        Persona {
            institution: self.institution.clone(),
            document_title: self.document_title.clone(),
            document_url: self.document_url.clone(),
        }
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
