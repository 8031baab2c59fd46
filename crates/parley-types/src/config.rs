//! Assistant configuration types for Parley.
//!
//! `AssistantConfig` represents the top-level `config.toml`: persona text,
//! endpoint settings, retention limits, summarization instruction, library
//! texts and origin allow-lists. Every field has a default, so an empty file
//! (or no file) yields a working configuration.
//!
//! Numeric settings are read leniently: a TOML integer or a numeric string
//! both work, and anything unusable falls back to a hardcoded value at the
//! accessor rather than failing the whole file.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::library::LibraryTexts;

/// Chat temperature used when the configured text is not a number.
pub const DEFAULT_TEMPERATURE: f64 = 1.3;

/// Fixed temperature for resummarization requests.
pub const SUMMARY_TEMPERATURE: f64 = 0.3;

/// Inclusive temperature bounds accepted by the endpoint.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

const FALLBACK_MAX_ROUNDS: u32 = 4;
const FALLBACK_REPLY_TOKENS: u32 = 100;
const FALLBACK_SUMMARY_TOKENS: u32 = 300;

const DEFAULT_ROLE_PROMPT: &str = "你是一个可爱的有鲨鱼尾巴的小女孩，主要用于测试，乐于为测试者提供一切需要的服务。在必要时应当回答包括已知的时间信息，摘要内容等相关的提问。";

const DEFAULT_SUMMARY_PROMPT: &str = "请基于之前的对话摘要和最新的对话内容，更新对话摘要。保留重要信息，添加新内容，确保摘要的连贯性和完整性。";

/// Top-level configuration for one assistant.
///
/// Loaded from `~/.parley/config.toml`. Does not derive `Debug`; the manual
/// impl redacts the API key.
#[derive(Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Persona text placed at the head of the system message.
    #[serde(default = "default_role_prompt")]
    pub role_prompt: String,

    /// Full chat-completion URL (not a base URL).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for the endpoint.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_reply_tokens", deserialize_with = "lenient_u32")]
    pub max_reply_tokens: u32,

    #[serde(default = "default_max_summary_tokens", deserialize_with = "lenient_u32")]
    pub max_summary_tokens: u32,

    /// Rounds of history kept in the transcript.
    #[serde(default = "default_max_rounds", deserialize_with = "lenient_u32")]
    pub max_rounds: u32,

    /// Non-command messages must contain this to reach the assistant.
    #[serde(default = "default_trigger_keyword")]
    pub trigger_keyword: String,

    /// Chat temperature as text; see [`resolve_temperature`].
    #[serde(default = "default_temperature", deserialize_with = "text_or_number")]
    pub temperature: String,

    /// Instruction appended to resummarization requests.
    #[serde(default = "default_summary_prompt")]
    pub summary_prompt: String,

    #[serde(default)]
    pub libraries: LibraryTexts,

    /// Group origins allowed to trigger the assistant. Empty allows all.
    #[serde(default = "default_allowed_groups")]
    pub allowed_groups: Vec<String>,

    /// Private-chat origins allowed to trigger the assistant. Empty allows all.
    #[serde(default = "default_allowed_private")]
    pub allowed_private: Vec<String>,

    /// Upper bound on a single completion call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_role_prompt() -> String {
    DEFAULT_ROLE_PROMPT.to_string()
}

fn default_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_api_key() -> String {
    "sk-your-api-key-here".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_max_reply_tokens() -> u32 {
    600
}

fn default_max_summary_tokens() -> u32 {
    1000
}

fn default_max_rounds() -> u32 {
    16
}

fn default_trigger_keyword() -> String {
    "小伊".to_string()
}

fn default_temperature() -> String {
    "1.3".to_string()
}

fn default_summary_prompt() -> String {
    DEFAULT_SUMMARY_PROMPT.to_string()
}

fn default_allowed_groups() -> Vec<String> {
    vec!["QQ-Group:123456".to_string(), "QQ-Group:654321".to_string()]
}

fn default_allowed_private() -> Vec<String> {
    vec!["QQ:111111".to_string(), "QQ:222222".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            role_prompt: default_role_prompt(),
            api_url: default_api_url(),
            api_key: default_api_key(),
            model: default_model(),
            max_reply_tokens: default_max_reply_tokens(),
            max_summary_tokens: default_max_summary_tokens(),
            max_rounds: default_max_rounds(),
            trigger_keyword: default_trigger_keyword(),
            temperature: default_temperature(),
            summary_prompt: default_summary_prompt(),
            libraries: LibraryTexts::default(),
            allowed_groups: default_allowed_groups(),
            allowed_private: default_allowed_private(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    /// Round limit, falling back to 4 when configured as zero/unusable.
    pub fn effective_max_rounds(&self) -> usize {
        non_zero_or(self.max_rounds, FALLBACK_MAX_ROUNDS) as usize
    }

    pub fn effective_reply_tokens(&self) -> u32 {
        non_zero_or(self.max_reply_tokens, FALLBACK_REPLY_TOKENS)
    }

    pub fn effective_summary_tokens(&self) -> u32 {
        non_zero_or(self.max_summary_tokens, FALLBACK_SUMMARY_TOKENS)
    }

    /// Chat temperature from the configured text.
    pub fn chat_temperature(&self) -> f64 {
        resolve_temperature(&self.temperature)
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_reply_tokens", &self.max_reply_tokens)
            .field("max_summary_tokens", &self.max_summary_tokens)
            .field("max_rounds", &self.max_rounds)
            .field("trigger_keyword", &self.trigger_keyword)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn non_zero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback } else { value }
}

/// Parse a temperature setting: float text clamped to `[0.0, 2.0]`,
/// non-numeric text yields [`DEFAULT_TEMPERATURE`].
pub fn resolve_temperature(text: &str) -> f64 {
    match leading_float(text) {
        Some(t) => t.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
        None => DEFAULT_TEMPERATURE,
    }
}

/// Validate a user-supplied temperature without clamping.
///
/// Returns `None` for non-numeric or out-of-range input.
pub fn parse_temperature_strict(text: &str) -> Option<f64> {
    let t = leading_float(text)?;
    (TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1)
        .contains(&t)
        .then_some(t)
}

/// The longest numeric prefix of `text`, after leading whitespace.
///
/// `"1.5x"` reads as 1.5 and `".5"` as 0.5. Besides decimal literals only
/// the spelled-out `Infinity` is accepted, so `"inf"` and `"NaN"` are
/// `None`.
pub fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return text[..end + "Infinity".len()].parse().ok();
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    text[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Accept an integer or a numeric string; anything else becomes 0 so the
/// accessor fallback applies.
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => u32::try_from(n).unwrap_or(0),
        Raw::Float(f) if f >= 1.0 && f <= u32::MAX as f64 => f as u32,
        Raw::Float(_) => 0,
        Raw::Text(s) => s.trim().parse::<u32>().unwrap_or(0),
    })
}

/// Accept a string or a bare TOML number and keep it as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.max_rounds, 16);
        assert_eq!(config.max_reply_tokens, 600);
        assert_eq!(config.max_summary_tokens, 1000);
        assert_eq!(config.trigger_keyword, "小伊");
        assert!((config.chat_temperature() - 1.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AssistantConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_url, "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(config.allowed_groups.len(), 2);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_lenient_numbers() {
        let config: AssistantConfig = toml::from_str(
            r#"
max_rounds = "8"
max_reply_tokens = "lots"
max_summary_tokens = 0
temperature = 0.7
"#,
        )
        .unwrap();
        assert_eq!(config.effective_max_rounds(), 8);
        assert_eq!(config.effective_reply_tokens(), 100);
        assert_eq!(config.effective_summary_tokens(), 300);
        assert!((config.chat_temperature() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rounds_falls_back() {
        let config = AssistantConfig {
            max_rounds: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_max_rounds(), 4);
    }

    #[test]
    fn test_resolve_temperature_clamps() {
        assert!((resolve_temperature("5") - 2.0).abs() < f64::EPSILON);
        assert!((resolve_temperature("-1") - 0.0).abs() < f64::EPSILON);
        assert!((resolve_temperature("abc") - 1.3).abs() < f64::EPSILON);
        assert!((resolve_temperature(" 0.5 ") - 0.5).abs() < f64::EPSILON);
        assert!((resolve_temperature("NaN") - 1.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_temperature_reads_numeric_prefix() {
        assert!((resolve_temperature("1.5x") - 1.5).abs() < f64::EPSILON);
        assert!((resolve_temperature("0.7 warm") - 0.7).abs() < f64::EPSILON);
        assert!((resolve_temperature("inf") - 1.3).abs() < f64::EPSILON);
        assert!((resolve_temperature("Infinity") - 2.0).abs() < f64::EPSILON);
        assert!((resolve_temperature("-Infinity") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(leading_float("  .5"), Some(0.5));
        assert_eq!(leading_float("3."), Some(3.0));
        assert_eq!(leading_float("-2e1x"), Some(-20.0));
        assert_eq!(leading_float("1e"), Some(1.0));
        assert_eq!(leading_float("+1.25.3"), Some(1.25));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("-"), None);
        assert_eq!(leading_float("x1"), None);
        assert_eq!(leading_float(""), None);
    }

    #[test]
    fn test_parse_temperature_strict() {
        assert_eq!(parse_temperature_strict("1.5"), Some(1.5));
        assert_eq!(parse_temperature_strict("2"), Some(2.0));
        assert_eq!(parse_temperature_strict("2.1"), None);
        assert_eq!(parse_temperature_strict("-0.1"), None);
        assert_eq!(parse_temperature_strict("warm"), None);
        assert_eq!(parse_temperature_strict("1.3度"), Some(1.3));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AssistantConfig {
            api_key: "sk-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
