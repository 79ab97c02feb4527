//! Public result types re-used by external crates (e.g., the HTTP API layer).

use chat_log::InteractionStatus;
use chrono::{DateTime, Utc};
use document_source::BuildFailureKind;
use serde::Serialize;

use crate::select::{ExcerptKind, RelevantExcerpt};

/// Terminal state of one question.
#[derive(Clone, Debug, PartialEq)]
pub enum AnswerOutcome {
    /// The model answered (possibly with the refusal sentence).
    Answered { text: String },
    /// The completion call failed; `rendered` is the Markdown shown to the user.
    CompletionFailed {
        rendered: String,
        status: Option<u16>,
        kind: &'static str,
    },
    /// The document context could not be built; no completion was attempted.
    DocumentUnavailable {
        rendered: String,
        kind: BuildFailureKind,
        detail: String,
    },
}

impl AnswerOutcome {
    /// Text for the `response` field.
    pub fn text(&self) -> &str {
        match self {
            AnswerOutcome::Answered { text } => text,
            AnswerOutcome::CompletionFailed { rendered, .. }
            | AnswerOutcome::DocumentUnavailable { rendered, .. } => rendered,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerOutcome::Answered { .. })
    }

    /// Stable label for logs and audit metadata.
    pub fn label(&self) -> &'static str {
        match self {
            AnswerOutcome::Answered { .. } => "answered",
            AnswerOutcome::CompletionFailed { .. } => "completion_failed",
            AnswerOutcome::DocumentUnavailable { .. } => "document_unavailable",
        }
    }

    pub fn log_status(&self) -> InteractionStatus {
        if self.is_answered() {
            InteractionStatus::Success
        } else {
            InteractionStatus::Error
        }
    }
}

/// Shape of the excerpt sent with a relevance-strategy question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExcerptStats {
    pub kind: ExcerptKind,
    pub query_terms: Vec<String>,
    pub matched_sections: usize,
    pub chars: usize,
}

impl From<&RelevantExcerpt> for ExcerptStats {
    fn from(ex: &RelevantExcerpt) -> Self {
        Self {
            kind: ex.kind,
            query_terms: ex.query_terms.clone(),
            matched_sections: ex.matched_sections,
            chars: ex.body_chars(),
        }
    }
}

/// Everything the HTTP layer needs to answer one question.
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub session_id: String,
    pub outcome: AnswerOutcome,
    /// The context was built during this request (cache miss).
    pub context_loaded: bool,
    pub response_time_ms: u64,
    pub excerpt: Option<ExcerptStats>,
}

/// Cached-context view of a session, for diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub context_cached: bool,
    pub document_length: Option<usize>,
    pub processed_at: Option<DateTime<Utc>>,
}
