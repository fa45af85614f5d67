//! Room persistence boundary.
//!
//! The router never holds rooms in memory between events: every handler
//! loads the record, computes the transition and writes it back. Anything
//! that can store strings under string keys can implement [`RoomStore`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use lobbyforge_protocol::RoomCode;
use parking_lot::Mutex;

use crate::Room;

/// Every room record lives under `room:<CODE>`.
pub const ROOM_KEY_PREFIX: &str = "room:";

/// The store key for `code`.
pub fn room_key(code: &RoomCode) -> String {
    format!("{ROOM_KEY_PREFIX}{code}")
}

/// Recovers the code from a `room:<CODE>` key.
pub fn code_from_key(key: &str) -> Option<RoomCode> {
    key.strip_prefix(ROOM_KEY_PREFIX)
        .and_then(|raw| RoomCode::parse(raw).ok())
}

/// Errors from a [`RoomStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("store backend failed: {0}")]
    Backend(String),

    /// A stored record is not a valid room.
    #[error("room record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value storage for rooms.
///
/// Implementations must be safe to call from many tasks at once; the
/// router guarantees that calls for the *same* code never overlap.
pub trait RoomStore: Send + Sync + 'static {
    /// Loads the room stored under `code`, if any.
    fn get(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    /// Creates or replaces the room stored under `code`.
    fn put(
        &self,
        code: &RoomCode,
        room: &Room,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the room under `code`. Deleting a missing room succeeds.
    fn delete(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Lists every key starting with `prefix`.
    fn list_keys(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// InMemoryRoomStore
// ---------------------------------------------------------------------------

/// A [`RoomStore`] over a `HashMap` of JSON strings.
///
/// Records are serialized exactly as a durable store would see them, so
/// tests exercise the same encoding. `set_failing(true)` makes every call
/// fail with [`StoreError::Backend`].
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    records: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The raw JSON stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    /// Stores raw JSON under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.records.lock().insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("in-memory store set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl RoomStore for InMemoryRoomStore {
    async fn get(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        self.check()?;
        let raw = self.records.lock().get(&room_key(code)).cloned();
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, code: &RoomCode, room: &Room) -> Result<(), StoreError> {
        self.check()?;
        let json = serde_json::to_string(room)?;
        self.records.lock().insert(room_key(code), json);
        Ok(())
    }

    async fn delete(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.check()?;
        self.records.lock().remove(&room_key(code));
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        let mut keys: Vec<String> = self
            .records
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use lobbyforge_transport::ConnectionId;

    use super::*;
    use crate::Player;

    fn code(raw: &str) -> RoomCode {
        RoomCode::parse(raw).unwrap()
    }

    fn sample_room() -> Room {
        let mut room = Room::new(ConnectionId::new(1), 6);
        room.players.push(Player::new(ConnectionId::new(2), "ada"));
        room
    }

    #[test]
    fn test_room_key_and_back() {
        let key = room_key(&code("abcd"));
        assert_eq!(key, "room:ABCD");
        assert_eq!(code_from_key(&key), Some(code("ABCD")));
    }

    #[test]
    fn test_code_from_key_rejects_foreign_keys() {
        assert_eq!(code_from_key("session:ABCD"), None);
        assert_eq!(code_from_key("room:TOOLONG"), None);
    }

    #[tokio::test]
    async fn test_in_memory_put_get_delete() {
        let store = InMemoryRoomStore::new();
        let c = code("ABCD");
        assert!(store.get(&c).await.unwrap().is_none());

        store.put(&c, &sample_room()).await.unwrap();
        assert_eq!(store.get(&c).await.unwrap(), Some(sample_room()));

        store.delete(&c).await.unwrap();
        assert!(store.get(&c).await.unwrap().is_none());
        // Deleting twice is fine.
        store.delete(&c).await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_stores_json_record() {
        let store = InMemoryRoomStore::new();
        store.put(&code("ABCD"), &sample_room()).await.unwrap();
        let raw = store.raw("room:ABCD").unwrap();
        assert!(raw.contains(r#""hostConnectionId":"conn-1""#));
        assert!(raw.contains(r#""state":"waiting""#));
    }

    #[tokio::test]
    async fn test_in_memory_list_keys_filters_prefix() {
        let store = InMemoryRoomStore::new();
        store.put(&code("BBBB"), &sample_room()).await.unwrap();
        store.put(&code("AAAA"), &sample_room()).await.unwrap();
        store.insert_raw("player:ada", "{}");

        let keys = store.list_keys(ROOM_KEY_PREFIX).await.unwrap();
        assert_eq!(keys, ["room:AAAA", "room:BBBB"]);
    }

    #[tokio::test]
    async fn test_in_memory_failing_store_errors() {
        let store = InMemoryRoomStore::new();
        store.set_failing(true);
        let result = store.put(&code("ABCD"), &sample_room()).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.is_empty());

        store.set_failing(false);
        store.put(&code("ABCD"), &sample_room()).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_malformed_record_is_serialization_error() {
        let store = InMemoryRoomStore::new();
        store.insert_raw("room:ABCD", "not json");
        let result = store.get(&code("ABCD")).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
