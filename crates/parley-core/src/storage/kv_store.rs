//! Key-value store trait.
//!
//! Defines the interface for the opaque blob store backing transcripts,
//! summaries and runtime settings. Implementations live in parley-infra
//! (SQLite) and [`super::memory`] (in-process).

use std::sync::Arc;

use parley_types::error::RepositoryError;

/// Trait for string-keyed persistent storage of opaque text blobs.
///
/// Values are whatever the caller wrote; the store never inspects them.
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a key. No-op if key does not exist.
    fn delete(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List all keys, sorted.
    fn list_keys(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}

impl<T: KvStore> KvStore for Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        (**self).set(key, value)
    }

    fn delete(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        (**self).delete(key)
    }

    fn list_keys(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send {
        (**self).list_keys()
    }
}
