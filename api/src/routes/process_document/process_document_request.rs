use serde::{Deserialize, Serialize};

use crate::error_handler::AppError;

pub const MAX_QUESTION_CHARS: usize = 1000;
pub const MAX_SESSION_ID_CHARS: usize = 100;

/// Request payload for /process-fixed-document.
#[derive(Debug, Deserialize)]
pub struct ProcessDocumentRequest {
    /// User question about the document.
    #[serde(default)]
    pub question: Option<String>,
    /// Existing session; a new one is generated when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ProcessDocumentRequest {
    /// Returns the question once both fields pass their limits.
    pub fn validate(&self) -> Result<&str, AppError> {
        let question = self
            .question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AppError::validation("question", "El campo question es obligatorio."))?;
        if question.chars().count() > MAX_QUESTION_CHARS {
            return Err(AppError::validation(
                "question",
                format!("La pregunta no puede superar {MAX_QUESTION_CHARS} caracteres."),
            ));
        }
        check_session_id(self.session_id.as_deref())?;
        Ok(question)
    }
}

pub fn check_session_id(session_id: Option<&str>) -> Result<(), AppError> {
    match session_id {
        Some(s) if s.chars().count() > MAX_SESSION_ID_CHARS => Err(AppError::validation(
            "session_id",
            format!("El session_id no puede superar {MAX_SESSION_ID_CHARS} caracteres."),
        )),
        _ => Ok(()),
    }
}

/// 200 payload, also used when the completion call failed (rendered error).
#[derive(Debug, Serialize)]
pub struct ProcessDocumentResponse {
    pub response: String,
    pub session_id: String,
    pub context_loaded: bool,
    pub response_time_ms: u64,
}

/// 500 payload when the document context could not be built.
#[derive(Debug, Serialize)]
pub struct DocumentFailureResponse {
    pub error: &'static str,
    pub response: String,
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(question: Option<&str>, session_id: Option<&str>) -> ProcessDocumentRequest {
        ProcessDocumentRequest {
            question: question.map(str::to_string),
            session_id: session_id.map(str::to_string),
        }
    }

    #[test]
    fn blank_or_missing_question_is_rejected() {
        assert!(req(None, None).validate().is_err());
        assert!(req(Some("   "), None).validate().is_err());
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let q = "ñ".repeat(MAX_QUESTION_CHARS);
        assert!(req(Some(&q), None).validate().is_ok());
        let q = "a".repeat(MAX_QUESTION_CHARS + 1);
        assert!(req(Some(&q), None).validate().is_err());

        let sid = "s".repeat(MAX_SESSION_ID_CHARS);
        assert!(req(Some("hola"), Some(&sid)).validate().is_ok());
        let sid = "s".repeat(MAX_SESSION_ID_CHARS + 1);
        assert!(req(Some("hola"), Some(&sid)).validate().is_err());
    }
}
