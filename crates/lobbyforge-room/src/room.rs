//! The room record: one host, an ordered list of players.
//!
//! A `Room` is plain data. It never mutates itself in response to
//! events; the [`lifecycle`](crate::lifecycle) functions take a snapshot,
//! build the next one, and the router persists it.

use lobbyforge_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::RoomStatus;
use crate::readiness;

/// Capacity assumed for records that predate the `capacity` field.
const LEGACY_CAPACITY: usize = 6;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A peer seated in a room.
///
/// `nickname` is the player's identity for the room's whole life:
/// a returning peer gets a new `connection_id` but keeps the nickname,
/// and with it their seat and readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub connection_id: ConnectionId,
    pub nickname: String,
    #[serde(default)]
    pub ready: bool,
}

impl Player {
    /// A freshly joined, not-yet-ready player.
    pub fn new(connection_id: ConnectionId, nickname: impl Into<String>) -> Self {
        Self {
            connection_id,
            nickname: nickname.into(),
            ready: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A room as stored under `room:<CODE>`.
///
/// The code itself is the store key and is not repeated inside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RoomRecord", from = "RoomRecord")]
pub struct Room {
    /// The game server instance that created the room. Never changes.
    pub host: ConnectionId,
    /// Maximum number of players.
    pub capacity: usize,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Set once `ALL_READY` has been sent for the current readiness
    /// episode, cleared when the room stops being all-ready.
    pub all_ready_notified: bool,
}

impl Room {
    /// An empty room owned by `host`.
    pub fn new(host: ConnectionId, capacity: usize) -> Self {
        Self {
            host,
            capacity,
            players: Vec::new(),
            all_ready_notified: false,
        }
    }

    /// Finds the player currently bound to `conn`.
    pub fn player(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id == conn)
    }

    pub(crate) fn player_mut(
        &mut self,
        conn: ConnectionId,
    ) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.connection_id == conn)
    }

    /// Finds the player holding `nickname` (case-sensitive).
    pub fn player_by_nickname(&self, nickname: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.nickname == nickname)
    }

    /// Removes the player bound to `conn`, keeping everyone else in order.
    pub(crate) fn remove_player(
        &mut self,
        conn: ConnectionId,
    ) -> Option<Player> {
        let index =
            self.players.iter().position(|p| p.connection_id == conn)?;
        Some(self.players.remove(index))
    }

    /// Every connection bound to this room, host first.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        std::iter::once(self.host)
            .chain(self.players.iter().map(|p| p.connection_id))
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn is_all_ready(&self) -> bool {
        readiness::all_ready(&self.players)
    }

    pub fn is_waiting(&self) -> bool {
        self.status() == RoomStatus::Waiting
    }

    pub fn status(&self) -> RoomStatus {
        if self.is_all_ready() {
            RoomStatus::AllReady
        } else if self.is_full() {
            RoomStatus::Full
        } else {
            RoomStatus::Waiting
        }
    }
}

// ---------------------------------------------------------------------------
// RoomRecord: the persisted JSON shape
// ---------------------------------------------------------------------------

/// Serialized form of [`Room`].
///
/// `state` is written from [`Room::status`] on every save and ignored on
/// load. Fields added after the first release default when absent.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRecord {
    host_connection_id: ConnectionId,
    #[serde(default = "legacy_capacity")]
    capacity: usize,
    #[serde(default)]
    players: Vec<Player>,
    #[serde(skip_deserializing)]
    state: RoomStatus,
    #[serde(default)]
    all_ready_notified: bool,
}

fn legacy_capacity() -> usize {
    LEGACY_CAPACITY
}

impl From<Room> for RoomRecord {
    fn from(room: Room) -> Self {
        let state = room.status();
        Self {
            host_connection_id: room.host,
            capacity: room.capacity,
            players: room.players,
            state,
            all_ready_notified: room.all_ready_notified,
        }
    }
}

impl From<RoomRecord> for Room {
    fn from(record: RoomRecord) -> Self {
        Self {
            host: record.host_connection_id,
            capacity: record.capacity,
            players: record.players,
            all_ready_notified: record.all_ready_notified,
        }
    }
}
