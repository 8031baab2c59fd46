//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](parley_core::llm::provider::LlmProvider)
//! used in production, plus a factory that builds it from the assistant
//! configuration.

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::AssistantConfig;
use parley_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;

/// Provider name shown in logs and spans: the endpoint's host.
pub fn provider_name_for(api_url: &str) -> String {
    reqwest::Url::parse(api_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "openai_compat".to_string())
}

/// Build the completion provider from configuration.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is configured.
pub fn create_provider(config: &AssistantConfig) -> Result<BoxLlmProvider, LlmError> {
    if config.api_key.trim().is_empty() {
        return Err(LlmError::AuthenticationFailed);
    }
    let provider = OpenAiCompatibleProvider::new(
        provider_name_for(&config.api_url),
        config.api_url.clone(),
        SecretString::from(config.api_key.clone()),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(BoxLlmProvider::new(provider))
}
