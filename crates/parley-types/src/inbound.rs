//! Inbound chat messages as delivered by the host platform.

use serde::{Deserialize, Serialize};

/// Who sent a message.
///
/// `user_id` is the platform's full identifier (e.g. `QQ:111111`) and is
/// also the key under which all per-user state is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
}

/// Where a message was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    Group { group_id: String },
    Private,
}

/// One inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: Sender,
    pub origin: Origin,
    pub text: String,
}

impl InboundMessage {
    pub fn private(user_id: impl Into<String>, nickname: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: Sender {
                user_id: user_id.into(),
                nickname: nickname.into(),
            },
            origin: Origin::Private,
            text: text.into(),
        }
    }

    pub fn group(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        nickname: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender: Sender {
                user_id: user_id.into(),
                nickname: nickname.into(),
            },
            origin: Origin::Group {
                group_id: group_id.into(),
            },
            text: text.into(),
        }
    }
}
