//! Readiness aggregation.
//!
//! A *readiness episode* starts the first time every player in a room is
//! ready and ends as soon as one of them isn't (someone cancels, or a new
//! unready player joins). `ALL_READY` and the match-start record fire once
//! per episode, tracked by [`Room::all_ready_notified`].

use crate::{Player, Room};

/// `true` when the room has at least one player and all of them are ready.
pub fn all_ready(players: &[Player]) -> bool {
    !players.is_empty() && players.iter().all(|p| p.ready)
}

/// Called after a player readies up. Returns `true` when this opens a
/// new episode, i.e. the caller must record the match and send
/// `ALL_READY`.
pub(crate) fn latch_on_ready(room: &mut Room) -> bool {
    if room.is_all_ready() && !room.all_ready_notified {
        room.all_ready_notified = true;
        true
    } else {
        false
    }
}

/// Called after every other transition. Clears the latch once the room
/// is no longer all-ready; never sets it.
pub(crate) fn reconcile(room: &mut Room) {
    if !room.is_all_ready() {
        room.all_ready_notified = false;
    }
}
