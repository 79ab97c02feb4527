//! Chat-completion access for the document assistant.
//!
//! Public surface:
//! - [`CompletionClient`]: `complete(system, user, profile)`, the seam used by callers
//! - [`service_profiles::LlmServiceProfiles`]: the real implementation over HTTP
//! - [`AiLlmError`]: unified failure type carrying upstream status and error object

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

use async_trait::async_trait;

pub use error_handler::{AiLlmError, UpstreamError};

/// Which timeout/size class a completion call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionProfile {
    /// Whole document in the prompt (90 s).
    Full,
    /// Relevance excerpt or one chunk (60 s).
    Excerpt,
}

/// One blocking completion per call; no retries, no streaming.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `system` + `user` messages and returns the answer text.
    ///
    /// # Errors
    /// Any transport, status, decode or empty-content failure as [`AiLlmError`].
    async fn complete(
        &self,
        system: &str,
        user: &str,
        profile: CompletionProfile,
    ) -> Result<String, AiLlmError>;
}
