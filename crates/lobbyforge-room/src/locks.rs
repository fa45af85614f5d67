//! Per-room mutual exclusion.
//!
//! Every load → transition → persist sequence for a room runs while
//! holding that room's [`RoomGuard`]. Events for different rooms never
//! wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use lobbyforge_protocol::RoomCode;
use tokio::sync::OwnedMutexGuard;

type LockTable = parking_lot::Mutex<HashMap<RoomCode, Arc<tokio::sync::Mutex<()>>>>;

/// Hands out one async lock per room code.
///
/// Entries are created on first use and removed when the last guard or
/// waiter for a code goes away, so the table only holds busy rooms.
#[derive(Debug, Default, Clone)]
pub struct RoomLocks {
    table: Arc<LockTable>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `code` is free and takes it.
    pub async fn lock(&self, code: &RoomCode) -> RoomGuard {
        let mutex = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(code.clone()).or_default())
        };
        let guard = mutex.lock_owned().await;
        RoomGuard {
            code: code.clone(),
            guard: Some(guard),
            table: Arc::clone(&self.table),
        }
    }

    /// Number of codes with a holder or waiter.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

/// Exclusive access to one room until dropped.
#[derive(Debug)]
pub struct RoomGuard {
    code: RoomCode,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl RoomGuard {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        // Release first so our own Arc no longer counts.
        drop(self.guard.take());
        let mut table = self.table.lock();
        if let Some(mutex) = table.get(&self.code) {
            if Arc::strong_count(mutex) == 1 {
                table.remove(&self.code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn code(raw: &str) -> RoomCode {
        RoomCode::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_lock_entry_pruned_after_release() {
        let locks = RoomLocks::new();
        {
            let guard = locks.lock(&code("AAAA")).await;
            assert_eq!(guard.code(), &code("AAAA"));
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_lock_same_code_serializes() {
        let locks = RoomLocks::new();
        let first = locks.lock(&code("AAAA")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&code("AAAA")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "second holder must wait");

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_lock_different_codes_independent() {
        let locks = RoomLocks::new();
        let _a = locks.lock(&code("AAAA")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(200),
            locks.lock(&code("BBBB")),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_entry_kept_while_waiter_pending() {
        let locks = RoomLocks::new();
        let first = locks.lock(&code("AAAA")).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.lock(&code("AAAA")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        // The waiter now holds the lock, so the entry must survive.
        let second = waiter.await.unwrap();
        assert_eq!(locks.len(), 1);
        drop(second);
        assert!(locks.is_empty());
    }
}
