//! Audit trail of chat sessions and interactions.
//!
//! Pure observability: nothing here feeds back into answering. Callers are
//! expected to invoke [`InteractionLogger::record`] after the reply is final,
//! from a detached task, and to discard its errors.

mod sqlite;

pub use sqlite::SqliteChatLog;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatLogError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome stored in `chat_interactions.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Success,
    Error,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Success => "success",
            InteractionStatus::Error => "error",
        }
    }
}

/// Document metadata recorded on the session when its context was built.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub url: String,
    pub length: usize,
    pub processed_at: DateTime<Utc>,
}

/// One question/answer exchange.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub session_id: String,
    pub question: String,
    pub response: String,
    pub response_time_ms: u64,
    pub status: InteractionStatus,
    /// Set only when the context was freshly built for this request.
    pub document: Option<DocumentInfo>,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait InteractionLogger: Send + Sync {
    /// Short backend label for diagnostics (`sqlite`, `noop`).
    fn backend(&self) -> &'static str;

    /// Upserts the session (question count, last activity, document info)
    /// and appends the interaction.
    async fn record(&self, interaction: Interaction) -> Result<(), ChatLogError>;
}

/// Logger that drops everything; used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatLog;

#[async_trait]
impl InteractionLogger for NoopChatLog {
    fn backend(&self) -> &'static str {
        "noop"
    }

    async fn record(&self, interaction: Interaction) -> Result<(), ChatLogError> {
        tracing::trace!(session_id = %interaction.session_id, "interaction not persisted (no-op log)");
        Ok(())
    }
}
