//! OpenAI-compatible chat-completion provider.
//!
//! Posts `{model, messages, max_tokens, temperature}` to the configured
//! endpoint URL with a bearer token and reads `choices[0].message.content`.
//! The URL is used as-is (it already names the `/chat/completions` path),
//! which is how DeepSeek and most compatible gateways are configured.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use parley_core::llm::provider::LlmProvider;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

/// Provider for any endpoint that speaks the chat-completions protocol.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    endpoint: String,
    api_key: SecretString,
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        provider_name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            provider_name: provider_name.into(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// No Debug: the struct holds the API key.

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Decode a successful response body.
///
/// A body without `choices[0].message.content` is an [`LlmError::EmptyResponse`].
pub fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(LlmError::EmptyResponse)?;

    let usage = completion
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: completion.id,
        content,
        model: completion.model,
        usage,
    })
}

fn classify_status(status: reqwest::StatusCode, retry_after: Option<u64>, body: String) -> LlmError {
    match status.as_u16() {
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        code => LlmError::Http { status: code, body },
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout.as_secs())
                } else {
                    LlmError::Provider {
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion endpoint returned an error");
            return Err(classify_status(status, retry_after, body));
        }

        let body = response.text().await.map_err(|e| LlmError::Provider {
            message: format!("failed to read response body: {e}"),
        })?;
        parse_completion(&body)
    }
}
