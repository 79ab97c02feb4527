/// Represents the provider (backend) used for chat completions.
///
/// Both providers speak the OpenAI chat-completions protocol; the variant
/// only changes attribution in errors and logs.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "deepseek".parse().unwrap();
/// assert_eq!(p, LlmProvider::DeepSeek);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// DeepSeek chat API (`https://api.deepseek.com`).
    DeepSeek,
    /// OpenAI's ChatGPT API.
    OpenAI,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(LlmProvider::DeepSeek),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            other => Err(other.to_string()),
        }
    }
}
