//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. This module provides a
//! `DatabasePool` with a multi-connection reader pool for concurrent reads
//! and a single-connection writer pool for serialized writes. The single
//! writer is what makes per-chat append order authoritative: there is one
//! durable append point and everything downstream observes its order.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Create a new DatabasePool with split reader/writer connections.
    ///
    /// Runs migrations automatically on the writer pool.
    /// Both pools use WAL journal mode, foreign key enforcement, and
    /// 5-second busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Run migrations on writer before opening reader pool
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Resolve the data directory from the `WORKLINK_DATA_DIR` env var,
/// falling back to `~/.worklink/`.
pub fn resolve_data_dir() -> std::path::PathBuf {
    match std::env::var("WORKLINK_DATA_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            std::path::PathBuf::from(home).join(".worklink")
        }
    }
}

/// Returns the default database URL based on [`resolve_data_dir`].
pub fn default_database_url() -> String {
    format!("sqlite://{}/worklink.db", resolve_data_dir().display())
}
