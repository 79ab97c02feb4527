//! Shared completion service with two profiles: `full` and `excerpt`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Implements [`CompletionClient`], the seam the orchestrator depends on.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{CompletionClient, CompletionProfile};
//! use ai_llm_service::config::default_config::{config_excerpt, config_full_document};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::new(config_full_document()?, config_excerpt()?));
//! let txt = svc.complete("Eres un asistente.", "Hola", CompletionProfile::Excerpt).await?;
//! println!("{txt}");
//! # Ok(()) }
//! ```

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CompletionClient, CompletionProfile,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::open_ai_service::OpenAiService,
};

/// Shared service holding the **full** and **excerpt** profiles.
pub struct LlmServiceProfiles {
    full: LlmModelConfig,
    excerpt: LlmModelConfig,

    clients: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service from the two profiles. Clients are built lazily.
    pub fn new(full: LlmModelConfig, excerpt: LlmModelConfig) -> Self {
        Self {
            full,
            excerpt,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Returns references to the current profiles `(full, excerpt)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.full, &self.excerpt)
    }

    fn config_for(&self, profile: CompletionProfile) -> &LlmModelConfig {
        match profile {
            CompletionProfile::Full => &self.full,
            CompletionProfile::Excerpt => &self.excerpt,
        }
    }

    async fn get_or_init(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

#[async_trait]
impl CompletionClient for LlmServiceProfiles {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        profile: CompletionProfile,
    ) -> Result<String, AiLlmError> {
        let cfg = self.config_for(profile);
        let cli = self.get_or_init(cfg).await?;
        cli.generate(user, Some(system)).await
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        if let Some(ref k) = self.api_key {
            k.hash(state);
        } else {
            0usize.hash(state);
        }
        self.timeout.hash(state);
    }
}
