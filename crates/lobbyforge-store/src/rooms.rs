use lobbyforge_protocol::RoomCode;
use lobbyforge_room::{Room, RoomStore, StoreError, room_key};
use sqlx::SqlitePool;

use crate::DbError;

/// A [`RoomStore`] keeping one JSON record per room in the `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteRoomStore {
    pool: SqlitePool,
}

impl SqliteRoomStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The stored JSON under `key`, undecoded.
    pub async fn raw(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn fetch(&self, code: &RoomCode) -> Result<Option<Room>, DbError> {
        match self.raw(&room_key(code)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, code: &RoomCode, room: &Room) -> Result<(), DbError> {
        let json = serde_json::to_string(room)?;
        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(room_key(code))
            .bind(json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, code: &RoomCode) -> Result<(), DbError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(room_key(code))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        let keys = sqlx::query_scalar(
            "SELECT key FROM kv WHERE key LIKE ? ESCAPE '\\' ORDER BY key",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}

impl RoomStore for SqliteRoomStore {
    async fn get(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        Ok(self.fetch(code).await?)
    }

    async fn put(&self, code: &RoomCode, room: &Room) -> Result<(), StoreError> {
        Ok(self.upsert(code, room).await?)
    }

    async fn delete(&self, code: &RoomCode) -> Result<(), StoreError> {
        Ok(self.remove(code).await?)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.keys(prefix).await?)
    }
}

/// Escapes `LIKE` wildcards so `prefix` matches literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_plain_prefix_unchanged() {
        assert_eq!(escape_like("room:"), "room:");
    }

    #[test]
    fn test_escape_like_wildcards_escaped() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }
}
