//! Default completion configs loaded from environment variables.
//!
//! Two profiles share the same provider/model and differ only in timeout:
//!
//! - **Full**    → whole document in the prompt, 90 s timeout
//! - **Excerpt** → relevance excerpt or a single chunk, 60 s timeout
//!
//! # Environment variables
//!
//! - `LLM_KIND`          = provider kind (`deepseek` (default) or `openai`)
//! - `LLM_ENDPOINT`      = base URL (default `https://api.deepseek.com`)
//! - `LLM_MODEL`         = model id (default `deepseek-chat`)
//! - `DEEPSEEK_API_KEY`  = bearer key (mandatory)
//! - `LLM_MAX_TOKENS`    = optional max tokens (default 1500)
//! - `LLM_TEMPERATURE`   = optional temperature (default 0.3)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_or, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Timeout for prompts carrying the whole document.
pub const FULL_TIMEOUT_SECS: u64 = 90;
/// Timeout for prompts carrying an excerpt or a chunk.
pub const EXCERPT_TIMEOUT_SECS: u64 = 60;

/// Reads everything except the timeout; both profiles build on this.
fn base_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = env_or("LLM_KIND", "deepseek")
        .parse::<LlmProvider>()
        .map_err(|_| ConfigError::InvalidFormat {
            var: "LLM_KIND",
            reason: "expected `deepseek` or `openai`",
        })?;

    let endpoint = env_or("LLM_ENDPOINT", DEFAULT_ENDPOINT);
    validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;

    let model = env_or("LLM_MODEL", DEFAULT_MODEL);
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let api_key = must_env("DEEPSEEK_API_KEY")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(1500);
    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(0.3);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: None,
    })
}

/// Config for prompts that embed the whole document (90 s timeout).
pub fn config_full_document() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        timeout_secs: Some(FULL_TIMEOUT_SECS),
        ..base_from_env()?
    })
}

/// Config for excerpt and chunk prompts (60 s timeout).
pub fn config_excerpt() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        timeout_secs: Some(EXCERPT_TIMEOUT_SECS),
        ..base_from_env()?
    })
}
