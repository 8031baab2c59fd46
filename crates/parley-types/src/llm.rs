//! LLM request/response types for Parley.
//!
//! These types model the data shapes exchanged with a chat-completion
//! endpoint: messages, completion requests, responses, and error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to a chat-completion endpoint.
///
/// Serializes to the OpenAI-compatible wire shape
/// `{model, messages, max_tokens, temperature}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from a chat-completion endpoint, reduced to what Parley uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage reported by the endpoint (informational only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from LLM provider operations.
///
/// Every variant is a remote failure from the caller's point of view; the
/// chat path treats all of them the same way (reset and notify).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid API response")]
    EmptyResponse,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let role = MessageRole::Assistant;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("tool".parse::<MessageRole>().is_err());
        assert!(serde_json::from_str::<MessageRole>("\"tool\"").is_err());
    }

    #[test]
    fn test_completion_request_wire_shape() {
        let request = CompletionRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![Message::system("persona"), Message::user("hi")],
            max_tokens: 600,
            temperature: Some(1.3),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["max_tokens"], 600);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert!((value["temperature"].as_f64().unwrap() - 1.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_temperature_omitted_when_unset() {
        let request = CompletionRequest {
            model: "m".to_string(),
            messages: vec![],
            max_tokens: 1,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500");
        assert_eq!(LlmError::Timeout(60).to_string(), "request timed out after 60s");
    }
}
