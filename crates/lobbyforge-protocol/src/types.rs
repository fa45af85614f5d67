//! Core protocol types for Lobbyforge's wire format.
//!
//! Every frame on the wire carries exactly one named event:
//!
//! ```json
//! { "event": "ROOM_JOIN_REQUEST", "data": { "roomCode": "ABCD", "nickname": "ada" } }
//! ```
//!
//! Events that carry nothing omit `data` entirely (`{"event":"ALL_READY"}`).
//! [`ClientEvent`] is what hosts and peers send in, [`ServerEvent`] is
//! what the lobby sends back out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short, human-typable identifier of a room.
///
/// A room code is exactly [`RoomCode::LENGTH`] ASCII letters or digits,
/// always stored upper-case. Players type it from the host's screen, so
/// parsing is forgiving: surrounding whitespace is trimmed and lower-case
/// input is accepted (`" abcd "` and `"ABCD"` name the same room).
///
/// This is a "newtype wrapper" around `String`. Once you hold a
/// `RoomCode`, it is known to be well-formed: the only ways to build one
/// are [`RoomCode::parse`] and the `FromStr`/`Deserialize` impls, which
/// both go through the same validation.
///
/// `#[serde(into = "String", try_from = "String")]` makes the JSON form a
/// plain string (`"ABCD"`) and re-validates on the way back in, so a
/// malformed code in a message can never sneak past the type.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in every room code.
    pub const LENGTH: usize = 4;

    /// Parses user input into a room code.
    ///
    /// Trims whitespace, upper-cases, then checks that exactly
    /// [`RoomCode::LENGTH`] ASCII alphanumeric characters remain.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] carrying the raw input.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        let well_formed = code.len() == Self::LENGTH
            && code.bytes().all(|b| b.is_ascii_alphanumeric());
        if well_formed {
            Ok(Self(code))
        } else {
            Err(ProtocolError::InvalidRoomCode(raw.to_string()))
        }
    }

    /// Returns the code as a string slice (always upper-case).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// ---------------------------------------------------------------------------
// ClientEvent: what hosts and peers send
// ---------------------------------------------------------------------------

/// An event sent by a host (game server instance) or peer (player).
///
/// ## Serde attributes explained
///
/// - `tag = "event", content = "data"` produces "adjacently tagged" JSON:
///   the variant name goes in `"event"`, its fields in `"data"`.
/// - `rename_all = "SCREAMING_SNAKE_CASE"` turns `RoomJoinRequest` into
///   `"ROOM_JOIN_REQUEST"`.
/// - `rename_all_fields = "camelCase"` turns `room_code` inside every
///   variant into `"roomCode"`.
///
/// Room codes arrive as raw strings rather than [`RoomCode`] on purpose:
/// a badly typed code is a normal user mistake answered with
/// `ERROR_INVALID_ROOM`, not a malformed frame answered with
/// `ERROR_BAD_REQUEST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Host → lobby: open a new room with this connection as its host.
    CreateRoom,

    /// Peer → lobby: join (or rejoin) a room under a nickname.
    ///
    /// Rejoining with the nickname of a player whose connection dropped
    /// resumes that player's seat and readiness.
    RoomJoinRequest { room_code: String, nickname: String },

    /// Peer → lobby: this player is ready to start.
    ///
    /// The player is identified by the sending connection. `nickName`
    /// is accepted for compatibility with older clients that send it,
    /// and is ignored.
    ReadyToStart {
        room_code: String,
        /// `#[serde(default)]` lets clients leave the field out entirely;
        /// `skip_serializing_if` keeps it out of the JSON when `None`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nick_name: Option<String>,
    },

    /// Peer → lobby: this player is no longer ready.
    NotReady { room_code: String },

    /// Any → lobby: keep-alive. Answered with `HEARTBEAT_ACK`.
    Heartbeat,
}

impl ClientEvent {
    /// The event's wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom => "CREATE_ROOM",
            Self::RoomJoinRequest { .. } => "ROOM_JOIN_REQUEST",
            Self::ReadyToStart { .. } => "READY_TO_START",
            Self::NotReady { .. } => "NOT_READY",
            Self::Heartbeat => "HEARTBEAT",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: what the lobby sends
// ---------------------------------------------------------------------------

/// An event sent by the lobby to a host or peer.
///
/// Same adjacently-tagged shape as [`ClientEvent`]. Events are grouped by
/// who receives them:
///
/// - **Acks** go to the connection that asked (`ROOM_CREATED`,
///   `PLAYER_JOINED_ACK`, `PLAYER_RECONNECT_ACK`).
/// - **Errors** go to the connection that asked and never change state.
/// - **Notifications** go to the room's host (`PLAYER_*`, `ALL_READY`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    // -- Acks ---------------------------------------------------------------
    /// The host's room exists; show `roomCode` to players.
    RoomCreated { room_code: RoomCode },

    /// The peer was admitted as a new player.
    PlayerJoinedAck { room_code: RoomCode, nickname: String },

    /// The peer resumed an existing seat. `ready` is the preserved
    /// readiness so the client can restore its UI.
    PlayerReconnectAck {
        room_code: RoomCode,
        nickname: String,
        ready: bool,
    },

    // -- Errors -------------------------------------------------------------
    /// No room with that code (or the code is malformed).
    ErrorInvalidRoom,
    /// The room already holds as many players as it allows.
    ErrorRoomFull,
    /// Another connected player already uses that nickname.
    ErrorNameTaken,
    /// The nickname is empty or too long.
    ErrorInvalidNickname,
    /// The connection already hosts a room or plays in another one.
    ErrorAlreadyInRoom,
    /// Room storage failed; nothing changed, try again.
    ErrorUnavailable,
    /// The frame could not be decoded as a [`ClientEvent`].
    ErrorBadRequest { message: String },

    // -- Host notifications -------------------------------------------------
    PlayerJoined { nickname: String },
    PlayerReconnected { nickname: String },
    PlayerLeft { nickname: String },
    PlayerReady { nickname: String },
    PlayerNotReady { nickname: String },
    /// Every player in the room is ready. Sent once per readiness episode.
    AllReady,

    // -- Keep-alive ---------------------------------------------------------
    HeartbeatAck,
}

impl ServerEvent {
    /// The event's wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "ROOM_CREATED",
            Self::PlayerJoinedAck { .. } => "PLAYER_JOINED_ACK",
            Self::PlayerReconnectAck { .. } => "PLAYER_RECONNECT_ACK",
            Self::ErrorInvalidRoom => "ERROR_INVALID_ROOM",
            Self::ErrorRoomFull => "ERROR_ROOM_FULL",
            Self::ErrorNameTaken => "ERROR_NAME_TAKEN",
            Self::ErrorInvalidNickname => "ERROR_INVALID_NICKNAME",
            Self::ErrorAlreadyInRoom => "ERROR_ALREADY_IN_ROOM",
            Self::ErrorUnavailable => "ERROR_UNAVAILABLE",
            Self::ErrorBadRequest { .. } => "ERROR_BAD_REQUEST",
            Self::PlayerJoined { .. } => "PLAYER_JOINED",
            Self::PlayerReconnected { .. } => "PLAYER_RECONNECTED",
            Self::PlayerLeft { .. } => "PLAYER_LEFT",
            Self::PlayerReady { .. } => "PLAYER_READY",
            Self::PlayerNotReady { .. } => "PLAYER_NOT_READY",
            Self::AllReady => "ALL_READY",
            Self::HeartbeatAck => "HEARTBEAT_ACK",
        }
    }

    /// Returns `true` for the `ERROR_*` events.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ErrorInvalidRoom
                | Self::ErrorRoomFull
                | Self::ErrorNameTaken
                | Self::ErrorInvalidNickname
                | Self::ErrorAlreadyInRoom
                | Self::ErrorUnavailable
                | Self::ErrorBadRequest { .. }
        )
    }
}

// =========================================================================
// Tests
// =========================================================================
