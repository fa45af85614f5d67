//! Room lifecycle and event routing for Lobbyforge.
//!
//! A room pairs one host connection (a game server instance) with up to
//! `capacity` peer connections (players). This crate decides who gets in,
//! tracks readiness, and tears rooms down when their host leaves.
//!
//! # Key types
//!
//! - [`lifecycle`]: the state machine as pure functions returning a
//!   [`Transition`]
//! - [`EventRouter`]: runs transitions under per-room locks, persists
//!   them and delivers the resulting events
//! - [`RoomStore`] / [`MatchRecorder`]: the persistence boundaries, with
//!   in-memory implementations for tests and single-process use
//! - [`ConnectionRegistry`]: which room each connection is in
//! - [`Room`] / [`Player`]: the stored record

#![allow(async_fn_in_trait)]

mod code;
mod config;
mod error;
pub mod lifecycle;
mod locks;
mod outbox;
mod readiness;
mod recorder;
mod registry;
mod room;
mod router;
mod store;

pub use code::{CodeSource, RandomCodes, generate_code};
pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use lifecycle::{JoinOutcome, Transition};
pub use locks::{RoomGuard, RoomLocks};
pub use outbox::{EventSender, Outbox};
pub use readiness::all_ready;
pub use recorder::{InMemoryMatchRecorder, MatchRecorder, RecorderError};
pub use registry::{ConnectionRegistry, Membership, Role};
pub use room::{Player, Room};
pub use router::{EventRouter, RecoveryMode};
pub use store::{
    InMemoryRoomStore, ROOM_KEY_PREFIX, RoomStore, StoreError, code_from_key,
    room_key,
};
