use chrono::{DateTime, Utc};
use contextor::ChatOrchestrator;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Question answering pipeline (cache, document source, model, log).
    pub chat: ChatOrchestrator,
    /// Whether a completion API key was present at start-up.
    pub api_key_configured: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(chat: ChatOrchestrator) -> Self {
        Self {
            chat,
            api_key_configured: std::env::var("DEEPSEEK_API_KEY")
                .is_ok_and(|k| !k.trim().is_empty()),
            started_at: Utc::now(),
        }
    }

    /// Load shared state from environment variables.
    pub async fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(ChatOrchestrator::from_env().await?))
    }

    /// Diagnostics endpoints and `debug_info` payloads are off in production.
    pub fn expose_debug(&self) -> bool {
        !self.chat.config().is_production()
    }
}
