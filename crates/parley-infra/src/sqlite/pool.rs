//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time, so writes go through a
//! single-connection pool while reads share a small multi-connection pool.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::resolve_data_dir;

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "parley.db";

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: up to 4 connections for concurrent SELECT queries.
/// - `writer`: one connection for serialized INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools and run embedded migrations on the writer.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts)
            .await?;

        // Tables must exist before a read-only connection opens.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }

    /// Open `parley.db` inside `data_dir`.
    pub async fn open_in(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::new(&database_url_in(data_dir)).await
    }
}

pub fn database_url_in(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE).display())
}

/// Database URL under the resolved data directory (`PARLEY_DATA_DIR` or
/// `~/.parley`).
pub fn default_database_url() -> String {
    database_url_in(&resolve_data_dir())
}
