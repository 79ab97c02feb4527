use serde::{Deserialize, Serialize};

use crate::{error_handler::AppError, routes::process_document::process_document_request::check_session_id};

/// Request payload for /clear-session.
#[derive(Debug, Deserialize)]
pub struct ClearSessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ClearSessionRequest {
    pub fn validate(&self) -> Result<&str, AppError> {
        let sid = self
            .session_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::validation("session_id", "El campo session_id es obligatorio."))?;
        check_session_id(Some(sid))?;
        Ok(sid)
    }
}

#[derive(Debug, Serialize)]
pub struct ClearSessionResponse {
    pub message: &'static str,
    pub session_id: String,
}
