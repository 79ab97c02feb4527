//! POST /process-fixed-document: answers a question about the fixed document.

use std::{any::Any, sync::Arc};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::{AnswerOutcome, render::Diagnostic};
use serde_json::json;
use tracing::error;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::process_document::process_document_request::{
        DocumentFailureResponse, ProcessDocumentRequest, ProcessDocumentResponse,
    },
};

const ROUTE: &str = "POST /process-fixed-document";
const DOCUMENT_FAILURE: &str = "No se pudo procesar el documento predefinido";

/// Handler: POST /process-fixed-document
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/process-fixed-document \
///   -H 'content-type: application/json' \
///   -d '{"question":"¿Cuál es el horario de atención?","session_id":"session_abc"}'
/// ```
pub async fn process_fixed_document(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessDocumentRequest>,
) -> AppResult<Response> {
    let question = body.validate()?.to_string();
    let session_id = body.session_id.clone();

    // A panic in the pipeline must surface as a diagnostic, not a dropped connection.
    let task_state = state.clone();
    let task_session = session_id.clone();
    let reply = tokio::spawn(async move {
        task_state
            .chat
            .ask(&question, task_session.as_deref())
            .await
    })
    .await
    .map_err(|join_err| {
        let message = if join_err.is_panic() {
            panic_message(join_err.into_panic())
        } else {
            join_err.to_string()
        };
        error!(route = ROUTE, %message, "request task aborted");
        AppError::Unexpected {
            diagnostic: Diagnostic::new("panic", message, ROUTE, session_id.clone()),
            expose_debug: state.expose_debug(),
        }
    })?;

    match &reply.outcome {
        AnswerOutcome::Answered { .. } | AnswerOutcome::CompletionFailed { .. } => {
            Ok(Json(ProcessDocumentResponse {
                response: reply.outcome.text().to_string(),
                session_id: reply.session_id,
                context_loaded: reply.context_loaded,
                response_time_ms: reply.response_time_ms,
            })
            .into_response())
        }
        AnswerOutcome::DocumentUnavailable { kind, detail, .. } => {
            let debug_info = state.expose_debug().then(|| {
                json!({
                    "kind": kind.as_str(),
                    "detail": detail,
                    "document_url": state.chat.config().document_url,
                    "location": ROUTE,
                })
            });
            let body = DocumentFailureResponse {
                error: DOCUMENT_FAILURE,
                response: reply.outcome.text().to_string(),
                session_id: Some(reply.session_id),
                debug_info,
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
