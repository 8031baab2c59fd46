//! In-process key-value store backed by `DashMap`.
//!
//! Used by tests and anywhere nothing should touch disk. State is lost when
//! the process exits.

use dashmap::DashMap;
use parley_types::error::RepositoryError;

use super::kv_store::KvStore;

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, RepositoryError> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = MemoryKvStore::new();
        store.set("b", "x").await.unwrap();
        store.set("a", "y").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b"]);

        store.delete("a").await.unwrap();
        store.delete("missing").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["b"]);
    }
}
