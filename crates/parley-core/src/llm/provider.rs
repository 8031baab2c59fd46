//! LlmProvider trait definition.
//!
//! This is the core abstraction the chat and summary paths call through.
//! Uses RPITIT for `complete`; see [`super::box_provider`] for the
//! object-safe wrapper.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for chat-completion backends.
///
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "deepseek").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
