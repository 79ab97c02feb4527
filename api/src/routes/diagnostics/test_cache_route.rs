//! GET /test-cache: write/read-back probe against the cache backend.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

/// Handler: GET /test-cache
///
/// 404 in production; 500 `{status:"error"}` when the backend is unreachable.
pub async fn test_cache(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    if !state.expose_debug() {
        return Err(AppError::NotFound);
    }

    let res = match state.chat.store().probe().await {
        Ok(report) => Json(json!({
            "status": "success",
            "backend": report.backend,
            "test_key": report.test_key,
            "stored_value": report.stored_value,
            "retrieved_value": report.retrieved_value,
            "match": report.matches,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "cache probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Cache is not working",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    };
    Ok(res)
}
