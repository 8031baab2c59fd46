//! Per-user rolling transcript.
//!
//! A transcript is the ordered message history sent to the completion
//! endpoint. It is persisted as a bare JSON array of `{role, content}`
//! objects, so [`Transcript`] is `#[serde(transparent)]`.
//!
//! Decoding persisted blobs is two-step: parse into a `serde_json::Value`,
//! check the structure, and only then convert into typed messages. A blob
//! that fails either step is reported as a [`TranscriptDecodeError`] so the
//! caller can fabricate fresh state instead of trusting its shape.

use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

/// Ordered per-user message history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

/// Why a persisted transcript blob could not be used.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptDecodeError {
    #[error("transcript is not valid JSON: {0}")]
    Parse(String),

    #[error("transcript structure is invalid")]
    Invalid,

    #[error("transcript contains an unknown message role: {0}")]
    UnknownRole(String),
}

impl Transcript {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The first message, if it is the system message.
    pub fn system_message(&self) -> Option<&Message> {
        self.messages
            .first()
            .filter(|m| m.role == MessageRole::System)
    }

    /// Number of complete rounds held after the system message.
    pub fn rounds(&self) -> usize {
        self.messages.len().saturating_sub(1) / 2
    }

    /// The last `n` messages (or all of them when shorter).
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Structural validity: non-empty, and every message carries content.
    ///
    /// Roles are enforced by [`MessageRole`] at decode time, so only the
    /// content needs checking here.
    pub fn is_valid(&self) -> bool {
        !self.messages.is_empty() && self.messages.iter().all(|m| !m.content.is_empty())
    }

    /// Decode a persisted blob.
    pub fn decode(raw: &str) -> Result<Self, TranscriptDecodeError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| TranscriptDecodeError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value and convert it.
    ///
    /// Only system, user and assistant roles are accepted.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TranscriptDecodeError> {
        if !is_valid_shape(&value) {
            return Err(TranscriptDecodeError::Invalid);
        }

        let serde_json::Value::Array(items) = value else {
            return Err(TranscriptDecodeError::Invalid);
        };

        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            let role = item["role"].as_str().unwrap_or_default();
            let role: MessageRole = role
                .parse()
                .map_err(|_| TranscriptDecodeError::UnknownRole(role.to_string()))?;
            let content = item["content"].as_str().unwrap_or_default().to_string();
            messages.push(Message { role, content });
        }

        Ok(Self { messages })
    }

    /// Encode for persistence.
    pub fn encode(&self) -> String {
        // Serializing plain strings and unit enums cannot fail.
        serde_json::to_string(&self.messages).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Shape check on an untyped value: a non-empty array of objects whose
/// `role` and `content` are non-empty strings.
pub fn is_valid_shape(value: &serde_json::Value) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    if items.is_empty() {
        return false;
    }
    items.iter().all(|item| {
        let non_empty = |field: &str| {
            item.get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
        };
        item.is_object() && non_empty("role") && non_empty("content")
    })
}
