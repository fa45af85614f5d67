use std::time::{SystemTime, UNIX_EPOCH};

use lobbyforge_protocol::RoomCode;
use lobbyforge_room::{MatchRecorder, RecorderError};
use sqlx::SqlitePool;

use crate::DbError;

/// One row of `match_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStart {
    pub id: i64,
    pub room_code: String,
    /// Milliseconds since the Unix epoch.
    pub started_at: i64,
}

/// A [`MatchRecorder`] appending to the `match_history` table.
#[derive(Debug, Clone)]
pub struct SqliteMatchRecorder {
    pool: SqlitePool,
}

impl SqliteMatchRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every start recorded for `code`, oldest first.
    pub async fn starts_for(&self, code: &RoomCode) -> Result<Vec<MatchStart>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, room_code, started_at FROM match_history WHERE room_code = ? ORDER BY id",
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, room_code, started_at)| MatchStart {
                id,
                room_code,
                started_at,
            })
            .collect())
    }

    /// Total number of recorded starts.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM match_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(&self, code: &RoomCode) -> Result<(), DbError> {
        sqlx::query("INSERT INTO match_history (room_code, started_at) VALUES (?, ?)")
            .bind(code.as_str())
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl MatchRecorder for SqliteMatchRecorder {
    async fn record_start(&self, code: &RoomCode) -> Result<(), RecorderError> {
        Ok(self.insert(code).await?)
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
