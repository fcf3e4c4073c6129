use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// SQLite database reached with a fresh connection per operation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database_url: Arc<str>,
}

impl SqliteStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Arc::from(database_url.into()),
        }
    }

    pub fn run_migrations(&self, migrations: EmbeddedMigrations) -> Result<(), StorageError> {
        let mut conn = establish(&self.database_url)?;
        conn.run_pending_migrations(migrations)
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Runs `f` on the blocking pool with its own connection.
    ///
    /// The connection is closed when `f` returns, whether it succeeded or not.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let database_url = Arc::clone(&self.database_url);
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = establish(&database_url)?;
            Ok(f(&mut conn)?)
        })
        .await?
    }
}

fn establish(database_url: &str) -> Result<SqliteConnection, StorageError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute("PRAGMA busy_timeout = 5000;")?;
    Ok(conn)
}
