use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::{ContextorError, render::Diagnostic};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ContextorError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    /// A request field failed validation.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("not found")]
    NotFound,

    /// Unexpected fault caught at the request boundary.
    #[error("unexpected internal error")]
    Unexpected {
        diagnostic: Diagnostic,
        /// Include the structured `debug_info` object in the body.
        expose_debug: bool,
    },
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,

            // 5xx
            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::Unexpected { .. } => "Error interno",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Unexpected {
            diagnostic,
            expose_debug,
        } = &self
        {
            let mut body = json!({
                "error": self.error_code(),
                "response": diagnostic.render(),
                "session_id": diagnostic.session_id,
            });
            if *expose_debug {
                body["debug_info"] = json!(diagnostic);
            }
            return (status, Json(body)).into_response();
        }

        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
            field: match &self {
                AppError::Validation { field, .. } => Some(*field),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
