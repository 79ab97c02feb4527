use crate::config::llm_provider::LlmProvider;

/// Configuration for a chat-completion model invocation.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::DeepSeek,
///     model: "deepseek-chat".to_string(),
///     endpoint: "https://api.deepseek.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(1500),
///     temperature: Some(0.3),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.timeout_secs, Some(60));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"deepseek-chat"`).
    pub model: String,

    /// Base URL; `/v1/chat/completions` is appended by the service.
    pub endpoint: String,

    /// API key sent as a bearer token.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
