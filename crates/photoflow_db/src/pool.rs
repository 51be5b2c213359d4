//! Connection pool creation and SQLite-specific tuning.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Store-level errors. Adapters and the core crate fold these into their own
/// error enums via `#[from]`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid database url: {0}")]
    InvalidUrl(String),

    #[error("migration error: {0}")]
    Migration(String),
}

/// Pool configuration. Assembled once at startup from [`crate::DB_PATH`]-style
/// environment defaults; never re-read from the environment afterward.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DbConfig {
    /// Open (creating if absent) a file-backed SQLite database at `path`.
    pub fn file(path: impl AsRef<str>) -> Self {
        Self {
            url: format!("sqlite:{}?mode=rwc", path.as_ref()),
            max_connections: 5,
        }
    }

    /// In-memory database, for tests.
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Create a pool from configuration, apply SQLite pragmas, and run the
/// bootstrap schema.
pub async fn create_pool(config: DbConfig) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|_| DbError::InvalidUrl(config.url.clone()))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    apply_sqlite_optimizations(&pool).await?;
    run_bootstrap_schema(&pool).await?;

    info!("connected to sqlite database");
    Ok(pool)
}

async fn apply_sqlite_optimizations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys=ON").execute(pool).await?;
    Ok(())
}

async fn run_bootstrap_schema(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::raw_sql(include_str!("schema.sql"))
        .execute(pool)
        .await
        .map_err(DbError::Database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_pool_bootstraps_schema() {
        let pool = create_pool(DbConfig::memory()).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }
}
