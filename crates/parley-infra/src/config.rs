//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`AssistantConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use parley_types::config::AssistantConfig;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
/// 3. `./.parley` when no home directory is known
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Load `{data_dir}/config.toml`.
///
/// - Missing file: [`AssistantConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
///
/// `PARLEY_API_KEY`, when set and non-empty, replaces the file's key.
pub async fn load_config(data_dir: &Path) -> AssistantConfig {
    let config = read_config_file(data_dir).await;
    apply_api_key_override(config, std::env::var(API_KEY_ENV).ok())
}

async fn read_config_file(data_dir: &Path) -> AssistantConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AssistantConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AssistantConfig::default();
        }
    };

    match toml::from_str::<AssistantConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AssistantConfig::default()
        }
    }
}

fn apply_api_key_override(mut config: AssistantConfig, env_key: Option<String>) -> AssistantConfig {
    if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = key;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.max_rounds, 16);
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
role_prompt = "你是测试助手"
model = "deepseek-reasoner"
max_rounds = 8
temperature = 0.7
allowed_groups = []

[libraries]
full = "资料"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.role_prompt, "你是测试助手");
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.chat_temperature(), 0.7);
        assert!(config.allowed_groups.is_empty());
        assert_eq!(config.libraries.full, "资料");
        // Untouched fields keep their defaults.
        assert_eq!(config.trigger_keyword, "小伊");
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.max_rounds, 16);
    }

    #[test]
    fn env_key_overrides_file_key() {
        let config = AssistantConfig {
            api_key: "from-file".to_string(),
            ..Default::default()
        };
        let config = apply_api_key_override(config, Some("from-env".to_string()));
        assert_eq!(config.api_key, "from-env");

        let config = apply_api_key_override(config, Some("   ".to_string()));
        assert_eq!(config.api_key, "from-env");

        let config = apply_api_key_override(config, None);
        assert_eq!(config.api_key, "from-env");
    }
}
