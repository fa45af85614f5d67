//! Wire protocol for Lobbyforge.
//!
//! This crate defines the "language" that hosts, peers and the lobby
//! server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomCode`]): the
//!   named events that travel on the wire, one per frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding or when a room code is malformed.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! core (lifecycle rules). It doesn't know about connections, locks or
//! storage; it only knows what an event looks like.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room core → Protocol (ServerEvent) → Transport
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// Users write `use lobbyforge_protocol::ServerEvent` instead of
// `use lobbyforge_protocol::types::ServerEvent`.

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, RoomCode, ServerEvent};
