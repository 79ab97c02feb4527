//! Typed error for the contextor crate.
//!
//! Only start-up can fail: once built, the orchestrator turns every
//! per-request failure into an [`crate::AnswerOutcome`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Invalid or inconsistent environment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Completion service setup.
    #[error(transparent)]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Cache backend setup.
    #[error("context store error: {0}")]
    Store(#[from] context_store::StoreError),

    /// Document source setup.
    #[error("document source error: {0}")]
    Source(#[from] document_source::BuildFailure),

    /// Interaction log setup.
    #[error("chat log error: {0}")]
    ChatLog(#[from] chat_log::ChatLogError),
}
