//! Runtime settings that can change without editing `config.toml`.
//!
//! Currently only the chat temperature. An override set through the
//! `set-temperature` command is stored in the key-value store and wins over
//! the configured value.

use std::sync::Arc;

use parley_types::config::{AssistantConfig, resolve_temperature};
use parley_types::error::RepositoryError;
use tracing::warn;

use crate::storage::kv_store::KvStore;

/// Store key holding the temperature override text.
pub const TEMPERATURE_KEY: &str = "__settings_temperature";

pub struct Settings<S: KvStore> {
    store: Arc<S>,
    config: Arc<AssistantConfig>,
}

impl<S: KvStore> Settings<S> {
    pub fn new(store: Arc<S>, config: Arc<AssistantConfig>) -> Self {
        Self { store, config }
    }

    /// Effective chat temperature, clamped to `[0.0, 2.0]`.
    pub async fn temperature(&self) -> f64 {
        match self.store.get(TEMPERATURE_KEY).await {
            Ok(Some(text)) => resolve_temperature(&text),
            Ok(None) => self.config.chat_temperature(),
            Err(e) => {
                warn!(error = %e, "failed to read temperature override");
                self.config.chat_temperature()
            }
        }
    }

    /// Persist an override. The text is stored as given; callers validate.
    pub async fn set_temperature(&self, text: &str) -> Result<(), RepositoryError> {
        self.store.set(TEMPERATURE_KEY, text.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryKvStore;

    #[tokio::test]
    async fn test_override_wins() {
        let store = Arc::new(MemoryKvStore::new());
        let settings = Settings::new(
            store,
            Arc::new(AssistantConfig {
                temperature: "0.7".to_string(),
                ..Default::default()
            }),
        );
        assert!((settings.temperature().await - 0.7).abs() < 1e-9);

        settings.set_temperature("1.5").await.unwrap();
        assert!((settings.temperature().await - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unparsable_config_defaults() {
        let settings = Settings::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(AssistantConfig {
                temperature: "abc".to_string(),
                ..Default::default()
            }),
        );
        assert!((settings.temperature().await - 1.3).abs() < 1e-9);
    }
}
