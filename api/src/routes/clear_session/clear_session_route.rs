//! POST /clear-session: forgets the cached context of a session.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::clear_session::clear_session_request::{ClearSessionRequest, ClearSessionResponse},
};

/// Handler: POST /clear-session
///
/// Always 200 for a valid id, whether or not anything was cached.
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClearSessionRequest>,
) -> AppResult<Json<ClearSessionResponse>> {
    let session_id = body.validate()?;
    state.chat.clear_session(session_id).await;
    Ok(Json(ClearSessionResponse {
        message: "Sesión limpiada exitosamente",
        session_id: session_id.to_string(),
    }))
}
