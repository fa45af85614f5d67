//! Unified error type for the Lobbyforge server.

use lobbyforge_protocol::ProtocolError;
use lobbyforge_room::{RoomError, StoreError};
use lobbyforge_store::DbError;
use lobbyforge_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (rejection, store failure, invariant).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The room store failed outside any room event.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The SQLite database could not be opened.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
