// ABOUTME: Database connection management and shared storage error type
// ABOUTME: Provides the SQLite pool used by all Agentdesk storage layers

use std::path::Path;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

/// Storage errors shared across all Agentdesk storage layers
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Resource not found")]
    NotFound,
    #[error("Duplicate agent name: {0}")]
    DuplicateName(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// True when the underlying SQLite error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Connect to the SQLite database at `path`, applying pragmas and migrations
pub async fn connect_pool(path: &Path) -> StorageResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    let database_url = format!("sqlite:{}?mode=rwc", path.display());

    debug!("Connecting to database: {}", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&database_url)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    run_migrations(&pool).await?;

    debug!("Database migrations completed");

    Ok(pool)
}

/// Connect to an in-memory database with migrations applied (tests).
/// A single connection keeps every caller on the same in-memory database.
pub async fn connect_memory_pool() -> StorageResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .map_err(StorageError::Sqlx)?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run the embedded migrations against an existing pool
pub async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_pool_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");

        let pool = connect_pool(&path).await.unwrap();
        assert!(path.exists());

        // Schema is in place
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }

    #[tokio::test]
    async fn test_memory_pool_has_schema() {
        let pool = connect_memory_pool().await.unwrap();
        for table in ["agents", "api_tokens", "agent_documents", "api_usage_logs"] {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            let row: (i64,) = sqlx::query_as(&sql).fetch_one(&pool).await.unwrap();
            assert_eq!(row.0, 0, "table {} should exist and be empty", table);
        }
    }
}
