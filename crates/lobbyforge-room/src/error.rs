//! Error types for the room layer.

use lobbyforge_protocol::{ProtocolError, RoomCode, ServerEvent};
use lobbyforge_transport::ConnectionId;

use crate::StoreError;

/// Errors that can occur during room operations.
///
/// The first group are client errors: the request was wrong and nothing
/// changed. `Store` and `CodesExhausted` are collaborator failures, also
/// leaving state untouched. `InvariantViolation` means the registry and
/// the stored room disagree.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code (or the code is malformed).
    #[error("room {0:?} not found")]
    NotFound(String),

    /// The room already holds `capacity` players.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Another live player in the room uses this nickname.
    #[error("nickname {nickname:?} is taken in room {code}")]
    NameTaken { code: RoomCode, nickname: String },

    /// Empty (after trimming) or longer than the configured maximum.
    #[error("invalid nickname {0:?}")]
    InvalidNickname(String),

    /// The connection hosts a room or plays in a different one.
    #[error("connection {0} is already in a room")]
    AlreadyInRoom(ConnectionId),

    /// The connection is not a player of the room it addressed.
    #[error("connection {conn} is not a player in room {code}")]
    NotAPlayer { code: RoomCode, conn: ConnectionId },

    /// Reading or writing the room store failed.
    #[error("room store failed: {0}")]
    Store(#[from] StoreError),

    /// Every generated code collided with an existing room.
    #[error("no free room code after {0} attempts")]
    CodesExhausted(u32),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registry and store disagree about a connection.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl RoomError {
    /// The single event sent back to the requesting connection.
    ///
    /// `None` for errors nobody asked for (invariant violations found
    /// while processing a disconnect).
    pub fn reply_event(&self) -> Option<ServerEvent> {
        match self {
            Self::NotFound(_) | Self::NotAPlayer { .. } => {
                Some(ServerEvent::ErrorInvalidRoom)
            }
            Self::RoomFull(_) => Some(ServerEvent::ErrorRoomFull),
            Self::NameTaken { .. } => Some(ServerEvent::ErrorNameTaken),
            Self::InvalidNickname(_) => {
                Some(ServerEvent::ErrorInvalidNickname)
            }
            Self::AlreadyInRoom(_) => Some(ServerEvent::ErrorAlreadyInRoom),
            Self::Store(_) | Self::CodesExhausted(_) | Self::Protocol(_) => {
                Some(ServerEvent::ErrorUnavailable)
            }
            Self::InvariantViolation(_) => None,
        }
    }

    /// Returns `true` when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::RoomFull(_)
                | Self::NameTaken { .. }
                | Self::InvalidNickname(_)
                | Self::AlreadyInRoom(_)
                | Self::NotAPlayer { .. }
        )
    }
}
