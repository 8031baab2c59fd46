//! Application state wiring all services together.
//!
//! AppState holds the configuration and the SQLite store shared by every
//! CLI command. Commands that talk to the model build the full assistant
//! on top of it with [`AppState::assistant`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use parley_core::clock::LocalClock;
use parley_core::dispatch::Dispatcher;
use parley_core::summary::worker::{DEFAULT_SUMMARY_DELAY, SummaryWorker};
use parley_infra::config::{load_config, resolve_data_dir};
use parley_infra::llm::create_provider;
use parley_infra::sqlite::kv::SqliteKvStore;
use parley_infra::sqlite::pool::DatabasePool;
use parley_types::config::AssistantConfig;

/// The dispatcher pinned to the SQLite store.
pub type ConcreteDispatcher = Dispatcher<SqliteKvStore>;

/// Shared application state.
pub struct AppState {
    pub config: AssistantConfig,
    pub kv_store: Arc<SqliteKvStore>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load `config.toml`, and open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_pool = DatabasePool::open_in(&data_dir)
            .await
            .context("failed to open database")?;

        Ok(Self {
            config,
            kv_store: Arc::new(SqliteKvStore::new(db_pool)),
            data_dir,
        })
    }

    /// Build the provider and dispatcher, and start the summary worker.
    ///
    /// The worker must be shut down before exit so pending summaries land.
    pub fn assistant(&self) -> anyhow::Result<(Arc<ConcreteDispatcher>, SummaryWorker)> {
        let provider = create_provider(&self.config).with_context(|| {
            format!(
                "no API key configured; set api_key in {} or PARLEY_API_KEY",
                self.data_dir.join("config.toml").display()
            )
        })?;

        let (dispatcher, worker) = Dispatcher::build(
            self.kv_store.clone(),
            provider,
            self.config.clone(),
            Arc::new(LocalClock),
            DEFAULT_SUMMARY_DELAY,
        );
        Ok((Arc::new(dispatcher), worker))
    }
}
