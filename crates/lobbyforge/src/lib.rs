//! # Lobbyforge
//!
//! A room lobby coordinator for multiplayer web games.
//!
//! A game server instance connects as a *host* and asks for a room; it
//! gets back a short code to show its players. Players connect as
//! *peers*, join by code and nickname, and mark themselves ready. The
//! host hears about every arrival, departure and readiness change, and
//! gets `ALL_READY` once everyone in the room is ready.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobbyforge::prelude::*;
//!
//! # async fn demo() -> Result<(), LobbyError> {
//! let server = LobbyServerBuilder::new()
//!     .bind("0.0.0.0:3003")
//!     .build(InMemoryRoomStore::new(), InMemoryMatchRecorder::new())
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! For durable rooms and match history, build with the SQLite adapters
//! from [`lobbyforge_store::Database`] instead.

mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use config::{
    ConfigError, LobbyConfig, RoomsSection, ServerSection, StorageBackend,
    StorageSection,
};
pub use error::LobbyError;
pub use server::{LobbyServer, LobbyServerBuilder};

/// Everything needed to embed a lobby server.
pub mod prelude {
    pub use crate::{
        LobbyConfig, LobbyError, LobbyServer, LobbyServerBuilder,
        StorageBackend,
    };
    pub use lobbyforge_protocol::{
        ClientEvent, Codec, JsonCodec, RoomCode, ServerEvent,
    };
    pub use lobbyforge_room::{
        EventRouter, InMemoryMatchRecorder, InMemoryRoomStore, MatchRecorder,
        RecoveryMode, Room, RoomConfig, RoomStore,
    };
    pub use lobbyforge_store::{Database, SqliteMatchRecorder, SqliteRoomStore};
    pub use lobbyforge_transport::ConnectionId;
}
