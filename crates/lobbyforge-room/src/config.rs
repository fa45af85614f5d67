//! Room configuration and derived room status.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room the router creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Maximum players per room (the host is not counted).
    ///
    /// Fixed into each room at creation, so changing it only affects
    /// rooms created afterwards.
    pub capacity: usize,

    /// Longest accepted nickname, in characters.
    pub max_nickname_len: usize,

    /// How many generated codes `create_room` tries before giving up.
    pub max_code_attempts: u32,

    /// When `true`, a returning player reclaims their seat even if the
    /// room is full. When `false`, capacity is checked first.
    pub reconnect_bypasses_capacity: bool,

    /// How long a disconnected peer keeps their seat. Zero removes them
    /// immediately.
    pub reconnect_grace: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            max_nickname_len: 32,
            max_code_attempts: 32,
            reconnect_bypasses_capacity: true,
            reconnect_grace: Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The status of a room, derived from its players on demand.
///
/// Never stored as a source of truth. Persisted records carry it as
/// `"state"` for anyone reading the store directly.
///
/// ```text
/// Waiting ──(len == capacity)──▶ Full
///    │                            │
///    └──────(all players ready)───┴──▶ AllReady
/// ```
///
/// `AllReady` wins over `Full` when both hold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Full,
    AllReady,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Full => write!(f, "full"),
            Self::AllReady => write!(f, "all_ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.capacity, 6);
        assert_eq!(config.max_nickname_len, 32);
        assert_eq!(config.max_code_attempts, 32);
        assert!(config.reconnect_bypasses_capacity);
        assert!(config.reconnect_grace.is_zero());
    }

    #[test]
    fn test_room_status_display_matches_serde() {
        for status in [RoomStatus::Waiting, RoomStatus::Full, RoomStatus::AllReady] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }

    #[test]
    fn test_room_status_default_is_waiting() {
        assert_eq!(RoomStatus::default(), RoomStatus::Waiting);
    }
}
