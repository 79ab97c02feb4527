//! GET /debug-info: configuration and per-session cache view.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use contextor::SessionSnapshot;
use serde::{Deserialize, Serialize};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::process_document::process_document_request::check_session_id,
};

#[derive(Debug, Deserialize)]
pub struct DebugInfoQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DebugInfoResponse {
    pub environment: String,
    pub document_url: String,
    pub strategy: &'static str,
    pub relevance_budget: usize,
    pub chunk_max_chars: usize,
    pub cache_backend: &'static str,
    pub context_ttl_secs: u64,
    pub model: Option<String>,
    pub api_key_configured: bool,
    pub chat_log: &'static str,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSnapshot>,
}

/// Handler: GET /debug-info[?session_id=...]
///
/// 404 when running in production.
pub async fn debug_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DebugInfoQuery>,
) -> AppResult<Json<DebugInfoResponse>> {
    if !state.expose_debug() {
        return Err(AppError::NotFound);
    }
    check_session_id(query.session_id.as_deref())?;

    let chat = &state.chat;
    let cfg = chat.config();
    let session = match query.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(sid) => Some(chat.describe_session(sid).await),
        None => None,
    };

    Ok(Json(DebugInfoResponse {
        environment: cfg.app_env.clone(),
        document_url: cfg.document_url.clone(),
        strategy: cfg.strategy.as_str(),
        relevance_budget: cfg.relevance_budget,
        chunk_max_chars: cfg.chunk_max_chars,
        cache_backend: chat.store().backend_name(),
        context_ttl_secs: chat.store().ttl().as_secs(),
        model: chat.model().map(str::to_string),
        api_key_configured: state.api_key_configured,
        chat_log: chat.logger_backend(),
        started_at: state.started_at,
        session,
    }))
}
