use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::{DbError, SqliteMatchRecorder, SqliteRoomStore};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS kv (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS match_history (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        room_code  TEXT NOT NULL,
        started_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS match_history_room_code
        ON match_history (room_code)",
];

/// A SQLite connection pool with the Lobbyforge schema applied.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Opens (creating if needed) the database at `path`.
    ///
    /// `":memory:"` gives a private in-memory database that lives as long
    /// as the returned handle and its clones.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let pool = if path == ":memory:" {
            // Each call gets its own named shared-cache database so
            // parallel tests never see each other's rows.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let uri = format!(
                "file:lobbyforge-memdb-{}-{id}?mode=memory&cache=shared",
                std::process::id()
            );
            let options = SqliteConnectOptions::new()
                .filename(&uri)
                .shared_cache(true)
                .create_if_missing(true);

            // The database vanishes with its last connection: keep one open.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(err) = std::fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), error = %err, "failed to create database directory");
                    }
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await?
        };

        Self::apply_schema(&pool).await?;
        if path != ":memory:" {
            sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        }

        tracing::info!(path, "database ready");
        Ok(Self { pool })
    }

    /// Shorthand for `Database::new(":memory:")`.
    pub async fn memory() -> Result<Self, DbError> {
        Self::new(":memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A room store sharing this pool.
    pub fn rooms(&self) -> SqliteRoomStore {
        SqliteRoomStore::new(self.pool.clone())
    }

    /// A match recorder sharing this pool.
    pub fn matches(&self) -> SqliteMatchRecorder {
        SqliteMatchRecorder::new(self.pool.clone())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn apply_schema(pool: &SqlitePool) -> Result<(), DbError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        tracing::debug!("schema applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_count(db: &Database) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('kv', 'match_history')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_database_memory_creates_schema() {
        let db = Database::memory().await.unwrap();
        assert_eq!(table_count(&db).await, 2);
    }

    #[tokio::test]
    async fn test_database_schema_is_idempotent() {
        let db = Database::memory().await.unwrap();
        Database::apply_schema(db.pool()).await.unwrap();
        assert_eq!(table_count(&db).await, 2);
    }

    #[tokio::test]
    async fn test_database_memory_instances_isolated() {
        let a = Database::memory().await.unwrap();
        let b = Database::memory().await.unwrap();
        sqlx::query("INSERT INTO kv (key, value) VALUES ('room:ABCD', '{}')")
            .execute(a.pool())
            .await
            .unwrap();

        let in_b: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv")
            .fetch_one(b.pool())
            .await
            .unwrap();
        assert_eq!(in_b, 0);
    }
}
