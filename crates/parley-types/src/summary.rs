//! Running conversation summary.
//!
//! The summary is the compensating memory for rounds trimmed out of the
//! transcript. It is persisted as JSON
//! (`{"content":..,"lastUpdated":..,"version":"1.0"}`), but older installs
//! stored the bare summary text. [`StoredSummary`] models both shapes.

use serde::{Deserialize, Serialize};

/// Version tag stamped on every saved summary.
pub const SUMMARY_VERSION: &str = "1.0";

/// A per-user running summary. Empty content means "no summary yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub content: String,
    pub last_updated: String,
    pub version: String,
}

impl Summary {
    /// An empty summary stamped with the given time.
    pub fn empty(now: impl Into<String>) -> Self {
        Self::new(String::new(), now)
    }

    pub fn new(content: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            last_updated: now.into(),
            version: SUMMARY_VERSION.to_string(),
        }
    }

    /// Whether there is any non-whitespace summary text.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The shapes a persisted summary blob can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSummary {
    /// JSON object with a string `content`. Missing metadata is `None`.
    Structured {
        content: String,
        last_updated: Option<String>,
        version: Option<String>,
    },
    /// Pre-JSON blob holding the bare summary text.
    Legacy(String),
    /// Valid JSON without a usable `content` field.
    Unusable,
}

impl StoredSummary {
    /// Classify a raw blob. Never fails: anything that is not JSON is a
    /// legacy string.
    pub fn decode(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return StoredSummary::Legacy(raw.to_string()),
        };

        match value.get("content").and_then(|c| c.as_str()) {
            Some(content) => StoredSummary::Structured {
                content: content.to_string(),
                last_updated: non_empty_str(&value, "lastUpdated"),
                version: non_empty_str(&value, "version"),
            },
            None => StoredSummary::Unusable,
        }
    }

    /// Resolve into a [`Summary`], filling gaps with `now` and the current
    /// version tag.
    pub fn into_summary(self, now: &str) -> Summary {
        match self {
            StoredSummary::Structured {
                content,
                last_updated,
                version,
            } => Summary {
                content,
                last_updated: last_updated.unwrap_or_else(|| now.to_string()),
                version: version.unwrap_or_else(|| SUMMARY_VERSION.to_string()),
            },
            StoredSummary::Legacy(content) => Summary::new(content, now),
            StoredSummary::Unusable => Summary::empty(now),
        }
    }
}

fn non_empty_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-01-19 12:00:00";

    #[test]
    fn test_summary_wire_names() {
        let s = Summary::new("facts", NOW);
        let json = s.encode();
        assert!(json.contains("\"lastUpdated\":\"2026-01-19 12:00:00\""));
        assert!(json.contains("\"version\":\"1.0\""));
    }

    #[test]
    fn test_decode_structured() {
        let raw = r#"{"content":"abc","lastUpdated":"2025-01-01 00:00:00","version":"1.0"}"#;
        let summary = StoredSummary::decode(raw).into_summary(NOW);
        assert_eq!(summary.content, "abc");
        assert_eq!(summary.last_updated, "2025-01-01 00:00:00");
    }

    #[test]
    fn test_decode_structured_missing_metadata() {
        let summary = StoredSummary::decode(r#"{"content":"abc"}"#).into_summary(NOW);
        assert_eq!(summary.last_updated, NOW);
        assert_eq!(summary.version, SUMMARY_VERSION);
    }

    #[test]
    fn test_decode_legacy_string() {
        let decoded = StoredSummary::decode("用户喜欢猫");
        assert_eq!(decoded, StoredSummary::Legacy("用户喜欢猫".to_string()));
        assert_eq!(decoded.into_summary(NOW).content, "用户喜欢猫");
    }

    #[test]
    fn test_decode_json_without_content() {
        assert_eq!(StoredSummary::decode("42"), StoredSummary::Unusable);
        assert_eq!(StoredSummary::decode("\"text\""), StoredSummary::Unusable);
        assert_eq!(
            StoredSummary::decode(r#"{"content":5}"#),
            StoredSummary::Unusable
        );
        assert!(!StoredSummary::Unusable.into_summary(NOW).has_content());
    }

    #[test]
    fn test_has_content_ignores_whitespace() {
        assert!(!Summary::new("  \n", NOW).has_content());
        assert!(Summary::new("x", NOW).has_content());
    }
}
