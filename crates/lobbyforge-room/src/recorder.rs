//! Match history boundary.
//!
//! When a room becomes all-ready for the first time in an episode, the
//! router records a match start. Recording is best effort: a failure is
//! logged and the lobby carries on.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use lobbyforge_protocol::RoomCode;
use parking_lot::Mutex;

/// A match start could not be recorded.
#[derive(Debug, thiserror::Error)]
#[error("match history unavailable: {0}")]
pub struct RecorderError(pub String);

/// Append-only log of match starts.
pub trait MatchRecorder: Send + Sync + 'static {
    fn record_start(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<(), RecorderError>> + Send;
}

/// A [`MatchRecorder`] that keeps starts in a `Vec`, in order.
#[derive(Debug, Default)]
pub struct InMemoryMatchRecorder {
    starts: Mutex<Vec<RoomCode>>,
    failing: AtomicBool,
}

impl InMemoryMatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every recorded start, oldest first.
    pub fn starts(&self) -> Vec<RoomCode> {
        self.starts.lock().clone()
    }

    pub fn count_for(&self, code: &RoomCode) -> usize {
        self.starts.lock().iter().filter(|c| *c == code).count()
    }
}

impl MatchRecorder for InMemoryMatchRecorder {
    async fn record_start(&self, code: &RoomCode) -> Result<(), RecorderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecorderError("in-memory recorder set to fail".into()));
        }
        self.starts.lock().push(code.clone());
        Ok(())
    }
}
