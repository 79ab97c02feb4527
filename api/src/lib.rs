//! HTTP surface of the document chat backend.
//!
//! Routes:
//! - `GET  /`                        chat page
//! - `POST /process-fixed-document`  answer a question about the document
//! - `POST /clear-session`           drop a session's cached context
//! - `GET  /debug-info`              configuration and session view (non-production)
//! - `GET  /test-cache`              cache round-trip probe (non-production)

use std::{env, sync::Arc};

pub mod core;
mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::core::app_state::AppState;
pub use error_handler::{AppError, AppResult};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        clear_session::clear_session_route::clear_session,
        diagnostics::{debug_info_route::debug_info, test_cache_route::test_cache},
        index_route::index,
        process_document::process_document_route::process_fixed_document,
    },
};

const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8080";

/// Full application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/process-fixed-document", post(process_fixed_document))
        .route("/clear-session", post(clear_session))
        .route("/debug-info", get(debug_info))
        .route("/test-cache", get(test_cache))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds state from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env().await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
