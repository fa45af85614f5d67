//! The room state machine as pure functions.
//!
//! Each function takes the current snapshot of a room (`None` when the
//! store has no record) plus the event's inputs and returns a
//! [`Transition`]: what to persist, whom to notify, and how the
//! connection registry changes. Nothing here touches the network, the
//! store or a lock, which is what makes every rule testable on its own.
//!
//! ```text
//!                 CreateRoom
//!                     │
//!                     ▼
//!   JoinRequest ─▶ [ Room ] ◀─ ReadyUp / CancelReady
//!                     │
//!     peer Disconnect │ host Disconnect / DestroyRoom
//!     (player removed)▼
//!                 [ deleted ]
//! ```
//!
//! Client errors come back as `Err(RoomError)` and always mean "no
//! change"; the router turns them into exactly one error event.

use lobbyforge_protocol::{RoomCode, ServerEvent};
use lobbyforge_transport::ConnectionId;

use crate::readiness;
use crate::{Player, Role, Room, RoomConfig, RoomError};

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// What should happen to the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Unchanged,
    Saved(Room),
    Deleted,
}

/// One event for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: ConnectionId,
    pub event: ServerEvent,
}

/// A registry update implied by the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Bind { connection: ConnectionId, role: Role },
    Unbind(ConnectionId),
}

/// The full effect of one event on one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub change: Change,
    /// Delivered in order after the change is persisted.
    pub notifications: Vec<Notification>,
    pub bindings: Vec<Binding>,
    /// A new readiness episode began: record the match start before
    /// `ALL_READY` goes out.
    pub match_started: bool,
}

impl Transition {
    fn new(change: Change) -> Self {
        Self {
            change,
            notifications: Vec::new(),
            bindings: Vec::new(),
            match_started: false,
        }
    }

    pub fn unchanged() -> Self {
        Self::new(Change::Unchanged)
    }

    /// Persists `next`, or leaves the record alone if it equals `current`.
    fn save_if_changed(current: &Room, next: Room) -> Self {
        if *current == next {
            Self::unchanged()
        } else {
            Self::new(Change::Saved(next))
        }
    }

    fn notify(mut self, to: ConnectionId, event: ServerEvent) -> Self {
        self.notifications.push(Notification { to, event });
        self
    }

    fn bind(mut self, connection: ConnectionId, role: Role) -> Self {
        self.bindings.push(Binding::Bind { connection, role });
        self
    }

    fn unbind(mut self, connection: ConnectionId) -> Self {
        self.bindings.push(Binding::Unbind(connection));
        self
    }
}

/// How a successful join resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Seated as a new player.
    Joined,
    /// Took back a seat held under the same nickname.
    Reconnected { ready: bool },
    /// The connection was already seated; nothing changed.
    AlreadyJoined,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A new empty room under `code`, hosted by `host`.
pub fn create(
    code: &RoomCode,
    host: ConnectionId,
    config: &RoomConfig,
) -> Transition {
    Transition::new(Change::Saved(Room::new(host, config.capacity)))
        .bind(host, Role::Host)
        .notify(
            host,
            ServerEvent::RoomCreated {
                room_code: code.clone(),
            },
        )
}

/// Admits, reconnects or rejects `conn` under `nickname`.
///
/// `is_live` reports whether a connection is still open. A nickname held
/// on a dead connection belongs to a player who dropped and may come
/// back; a nickname held on a live one is taken.
///
/// Checks run in this order:
///
/// 1. the room must exist,
/// 2. the nickname must be 1..=`max_nickname_len` characters after trim,
/// 3. a connection already seated gets its ack again, unchanged,
/// 4. a nickname on a dead connection is rebound to `conn` (before the
///    capacity check when `reconnect_bypasses_capacity`, after it
///    otherwise),
/// 5. a full room rejects,
/// 6. a nickname on a live connection is taken,
/// 7. otherwise the player is appended.
pub fn join(
    code: &RoomCode,
    room: Option<&Room>,
    conn: ConnectionId,
    nickname: &str,
    config: &RoomConfig,
    is_live: impl Fn(ConnectionId) -> bool,
) -> Result<(Transition, JoinOutcome), RoomError> {
    let room = room.ok_or_else(|| RoomError::NotFound(code.to_string()))?;

    let nickname = nickname.trim();
    let length = nickname.chars().count();
    if length == 0 || length > config.max_nickname_len {
        return Err(RoomError::InvalidNickname(nickname.to_string()));
    }

    if let Some(player) = room.player(conn) {
        let ack = ServerEvent::PlayerReconnectAck {
            room_code: code.clone(),
            nickname: player.nickname.clone(),
            ready: player.ready,
        };
        return Ok((
            Transition::unchanged().notify(conn, ack),
            JoinOutcome::AlreadyJoined,
        ));
    }

    let returning = room
        .player_by_nickname(nickname)
        .filter(|p| !is_live(p.connection_id));

    if config.reconnect_bypasses_capacity {
        if let Some(player) = returning {
            return Ok(rebind(code, room, player, conn));
        }
    }

    if room.is_full() {
        return Err(RoomError::RoomFull(code.clone()));
    }

    if let Some(player) = returning {
        return Ok(rebind(code, room, player, conn));
    }

    if room.player_by_nickname(nickname).is_some() {
        return Err(RoomError::NameTaken {
            code: code.clone(),
            nickname: nickname.to_string(),
        });
    }

    let mut next = room.clone();
    next.players.push(Player::new(conn, nickname));
    readiness::reconcile(&mut next);

    let transition = Transition::new(Change::Saved(next))
        .bind(conn, Role::Peer)
        .notify(
            room.host,
            ServerEvent::PlayerJoined {
                nickname: nickname.to_string(),
            },
        )
        .notify(
            conn,
            ServerEvent::PlayerJoinedAck {
                room_code: code.clone(),
                nickname: nickname.to_string(),
            },
        );
    Ok((transition, JoinOutcome::Joined))
}

/// Moves `player`'s seat to `conn`, keeping nickname and readiness.
fn rebind(
    code: &RoomCode,
    room: &Room,
    player: &Player,
    conn: ConnectionId,
) -> (Transition, JoinOutcome) {
    let stale = player.connection_id;
    let ready = player.ready;
    let nickname = player.nickname.clone();

    let mut next = room.clone();
    if let Some(seat) = next.player_mut(stale) {
        seat.connection_id = conn;
    }
    readiness::reconcile(&mut next);

    let transition = Transition::new(Change::Saved(next))
        .unbind(stale)
        .bind(conn, Role::Peer)
        .notify(
            room.host,
            ServerEvent::PlayerReconnected {
                nickname: nickname.clone(),
            },
        )
        .notify(
            conn,
            ServerEvent::PlayerReconnectAck {
                room_code: code.clone(),
                nickname,
                ready,
            },
        );
    (transition, JoinOutcome::Reconnected { ready })
}

/// Marks the player on `conn` ready. Opens a readiness episode when this
/// makes everyone ready and none is open yet.
pub fn ready_up(
    code: &RoomCode,
    room: Option<&Room>,
    conn: ConnectionId,
) -> Result<Transition, RoomError> {
    let room = room.ok_or_else(|| RoomError::NotFound(code.to_string()))?;
    let mut next = room.clone();
    let player = next.player_mut(conn).ok_or_else(|| RoomError::NotAPlayer {
        code: code.clone(),
        conn,
    })?;
    player.ready = true;
    let nickname = player.nickname.clone();

    let started = readiness::latch_on_ready(&mut next);

    let mut transition = Transition::save_if_changed(room, next)
        .notify(room.host, ServerEvent::PlayerReady { nickname });
    if started {
        transition.match_started = true;
        transition = transition.notify(room.host, ServerEvent::AllReady);
    }
    Ok(transition)
}

/// Marks the player on `conn` not ready, closing any open episode.
pub fn cancel_ready(
    code: &RoomCode,
    room: Option<&Room>,
    conn: ConnectionId,
) -> Result<Transition, RoomError> {
    let room = room.ok_or_else(|| RoomError::NotFound(code.to_string()))?;
    let mut next = room.clone();
    let player = next.player_mut(conn).ok_or_else(|| RoomError::NotAPlayer {
        code: code.clone(),
        conn,
    })?;
    player.ready = false;
    let nickname = player.nickname.clone();
    readiness::reconcile(&mut next);

    Ok(Transition::save_if_changed(room, next)
        .notify(room.host, ServerEvent::PlayerNotReady { nickname }))
}

/// Resolves a dropped connection.
///
/// The host leaving destroys the room; nobody is told. A peer leaving is
/// removed and the host gets `PLAYER_LEFT`, unless `keep_seat` is set, in
/// which case only the registry forgets the connection and the seat waits
/// for [`expire`] or a reconnect.
pub fn disconnect(
    code: &RoomCode,
    room: Option<&Room>,
    conn: ConnectionId,
    keep_seat: bool,
) -> Result<Transition, RoomError> {
    let room = room.ok_or_else(|| {
        RoomError::InvariantViolation(format!(
            "{conn} is bound to room {code}, which does not exist"
        ))
    })?;

    if room.host == conn {
        return Ok(teardown(room));
    }

    if room.player(conn).is_none() {
        return Err(RoomError::InvariantViolation(format!(
            "{conn} is neither host nor player of room {code}"
        )));
    }

    if keep_seat {
        return Ok(Transition::unchanged().unbind(conn));
    }

    Ok(remove_player(room, conn))
}

/// Ends a grace period for the dead `stale` connection. A player still
/// seated on it is removed; a host still on it takes the room down with
/// it. A no-op when the room is gone or the player already came back on
/// a new connection.
pub fn expire(room: Option<&Room>, stale: ConnectionId) -> Transition {
    match room {
        Some(room) if room.host == stale => teardown(room),
        Some(room) if room.player(stale).is_some() => {
            remove_player(room, stale)
        }
        _ => Transition::unchanged(),
    }
}

/// Deletes a room outright.
pub fn destroy(
    code: &RoomCode,
    room: Option<&Room>,
) -> Result<Transition, RoomError> {
    let room = room.ok_or_else(|| RoomError::NotFound(code.to_string()))?;
    Ok(teardown(room))
}

fn teardown(room: &Room) -> Transition {
    room.connections()
        .fold(Transition::new(Change::Deleted), |t, conn| t.unbind(conn))
}

fn remove_player(room: &Room, conn: ConnectionId) -> Transition {
    let mut next = room.clone();
    let Some(player) = next.remove_player(conn) else {
        return Transition::unchanged();
    };
    readiness::reconcile(&mut next);

    Transition::new(Change::Saved(next)).unbind(conn).notify(
        room.host,
        ServerEvent::PlayerLeft {
            nickname: player.nickname,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: ConnectionId = ConnectionId::new(1);

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn code() -> RoomCode {
        RoomCode::parse("ABCD").unwrap()
    }

    fn config() -> RoomConfig {
        RoomConfig {
            capacity: 3,
            ..RoomConfig::default()
        }
    }

    /// Players `(conn, nickname, ready)` seated in a capacity-3 room.
    fn room_with(players: &[(u64, &str, bool)]) -> Room {
        let mut room = Room::new(HOST, 3);
        for (id, nick, ready) in players {
            let mut p = Player::new(conn(*id), *nick);
            p.ready = *ready;
            room.players.push(p);
        }
        room
    }

    fn saved(t: &Transition) -> &Room {
        match &t.change {
            Change::Saved(room) => room,
            other => panic!("expected Saved, got {other:?}"),
        }
    }

    fn all_live(_: ConnectionId) -> bool {
        true
    }

    fn none_live(_: ConnectionId) -> bool {
        false
    }

    // =====================================================================
    // create
    // =====================================================================

    #[test]
    fn test_create_saves_empty_room_and_acks_host() {
        let t = create(&code(), HOST, &config());
        let room = saved(&t);
        assert_eq!(room.host, HOST);
        assert_eq!(room.capacity, 3);
        assert!(room.players.is_empty());
        assert_eq!(
            t.bindings,
            [Binding::Bind {
                connection: HOST,
                role: Role::Host
            }]
        );
        assert_eq!(
            t.notifications,
            [Notification {
                to: HOST,
                event: ServerEvent::RoomCreated { room_code: code() }
            }]
        );
    }

    // =====================================================================
    // join
    // =====================================================================

    #[test]
    fn test_join_missing_room_not_found() {
        let err = join(&code(), None, conn(2), "ada", &config(), all_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[test]
    fn test_join_new_player_appended_and_host_notified() {
        let room = room_with(&[(2, "ada", false)]);
        let (t, outcome) =
            join(&code(), Some(&room), conn(3), "bo", &config(), all_live)
                .unwrap();

        assert_eq!(outcome, JoinOutcome::Joined);
        let next = saved(&t);
        assert_eq!(next.players.len(), 2);
        assert_eq!(next.players[1], Player::new(conn(3), "bo"));
        assert_eq!(
            t.notifications,
            [
                Notification {
                    to: HOST,
                    event: ServerEvent::PlayerJoined {
                        nickname: "bo".into()
                    }
                },
                Notification {
                    to: conn(3),
                    event: ServerEvent::PlayerJoinedAck {
                        room_code: code(),
                        nickname: "bo".into()
                    }
                },
            ]
        );
        assert_eq!(
            t.bindings,
            [Binding::Bind {
                connection: conn(3),
                role: Role::Peer
            }]
        );
    }

    #[test]
    fn test_join_trims_nickname() {
        let room = room_with(&[]);
        let (t, _) =
            join(&code(), Some(&room), conn(2), "  ada ", &config(), all_live)
                .unwrap();
        assert_eq!(saved(&t).players[0].nickname, "ada");
    }

    #[test]
    fn test_join_blank_nickname_rejected() {
        let room = room_with(&[]);
        let err = join(&code(), Some(&room), conn(2), "   ", &config(), all_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::InvalidNickname(_)));
    }

    #[test]
    fn test_join_overlong_nickname_rejected() {
        let room = room_with(&[]);
        let long = "x".repeat(33);
        let err = join(&code(), Some(&room), conn(2), &long, &config(), all_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::InvalidNickname(_)));
    }

    #[test]
    fn test_join_same_connection_is_idempotent() {
        let room = room_with(&[(2, "ada", true)]);
        let (t, outcome) =
            join(&code(), Some(&room), conn(2), "ada", &config(), all_live)
                .unwrap();
        assert_eq!(outcome, JoinOutcome::AlreadyJoined);
        assert_eq!(t.change, Change::Unchanged);
        assert!(t.bindings.is_empty());
        assert_eq!(
            t.notifications,
            [Notification {
                to: conn(2),
                event: ServerEvent::PlayerReconnectAck {
                    room_code: code(),
                    nickname: "ada".into(),
                    ready: true
                }
            }]
        );
    }

    #[test]
    fn test_join_live_nickname_taken() {
        let room = room_with(&[(2, "ada", false)]);
        let err = join(&code(), Some(&room), conn(3), "ada", &config(), all_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::NameTaken { .. }));
    }

    #[test]
    fn test_join_nickname_is_case_sensitive() {
        let room = room_with(&[(2, "ada", false)]);
        let (_, outcome) =
            join(&code(), Some(&room), conn(3), "Ada", &config(), all_live)
                .unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
    }

    #[test]
    fn test_join_dead_nickname_reconnects_preserving_ready() {
        let room = room_with(&[(2, "ada", true), (3, "bo", false)]);
        let (t, outcome) =
            join(&code(), Some(&room), conn(9), "ada", &config(), none_live)
                .unwrap();

        assert_eq!(outcome, JoinOutcome::Reconnected { ready: true });
        let next = saved(&t);
        assert_eq!(next.players[0].connection_id, conn(9));
        assert!(next.players[0].ready);
        assert_eq!(next.players[1], room.players[1]);
        assert_eq!(
            t.bindings,
            [
                Binding::Unbind(conn(2)),
                Binding::Bind {
                    connection: conn(9),
                    role: Role::Peer
                }
            ]
        );
        assert_eq!(
            t.notifications[0],
            Notification {
                to: HOST,
                event: ServerEvent::PlayerReconnected {
                    nickname: "ada".into()
                }
            }
        );
        assert_eq!(
            t.notifications[1].event,
            ServerEvent::PlayerReconnectAck {
                room_code: code(),
                nickname: "ada".into(),
                ready: true
            }
        );
    }

    #[test]
    fn test_join_full_room_rejects_new_nickname() {
        let room = room_with(&[(2, "a", false), (3, "b", false), (4, "c", false)]);
        let err = join(&code(), Some(&room), conn(5), "d", &config(), all_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
    }

    #[test]
    fn test_join_full_room_reconnect_bypasses_capacity_by_default() {
        let room = room_with(&[(2, "a", false), (3, "b", false), (4, "c", false)]);
        let (_, outcome) =
            join(&code(), Some(&room), conn(5), "b", &config(), none_live)
                .unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected { ready: false });
    }

    #[test]
    fn test_join_full_room_reconnect_checked_when_bypass_disabled() {
        let room = room_with(&[(2, "a", false), (3, "b", false), (4, "c", false)]);
        let strict = RoomConfig {
            reconnect_bypasses_capacity: false,
            ..config()
        };
        let err = join(&code(), Some(&room), conn(5), "b", &strict, none_live)
            .unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
    }

    #[test]
    fn test_join_reconnect_with_bypass_disabled_still_works_below_capacity() {
        let room = room_with(&[(2, "a", true)]);
        let strict = RoomConfig {
            reconnect_bypasses_capacity: false,
            ..config()
        };
        let (_, outcome) =
            join(&code(), Some(&room), conn(5), "a", &strict, none_live)
                .unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected { ready: true });
    }

    #[test]
    fn test_join_unready_newcomer_closes_episode() {
        let mut room = room_with(&[(2, "a", true)]);
        room.all_ready_notified = true;
        let (t, _) =
            join(&code(), Some(&room), conn(3), "b", &config(), all_live)
                .unwrap();
        assert!(!saved(&t).all_ready_notified);
    }

    // =====================================================================
    // ready_up / cancel_ready
    // =====================================================================

    #[test]
    fn test_ready_up_partial_notifies_host_only() {
        let room = room_with(&[(2, "a", false), (3, "b", false)]);
        let t = ready_up(&code(), Some(&room), conn(2)).unwrap();
        assert!(saved(&t).players[0].ready);
        assert!(!t.match_started);
        assert_eq!(
            t.notifications,
            [Notification {
                to: HOST,
                event: ServerEvent::PlayerReady {
                    nickname: "a".into()
                }
            }]
        );
    }

    #[test]
    fn test_ready_up_last_player_starts_match() {
        let room = room_with(&[(2, "a", true), (3, "b", false)]);
        let t = ready_up(&code(), Some(&room), conn(3)).unwrap();
        assert!(t.match_started);
        assert!(saved(&t).all_ready_notified);
        let events: Vec<_> = t.notifications.iter().map(|n| &n.event).collect();
        assert_eq!(
            events,
            [
                &ServerEvent::PlayerReady {
                    nickname: "b".into()
                },
                &ServerEvent::AllReady
            ]
        );
    }

    #[test]
    fn test_ready_up_duplicate_inside_episode_does_not_restart() {
        let mut room = room_with(&[(2, "a", true), (3, "b", true)]);
        room.all_ready_notified = true;
        let t = ready_up(&code(), Some(&room), conn(2)).unwrap();
        assert!(!t.match_started);
        assert_eq!(t.change, Change::Unchanged);
        assert_eq!(t.notifications.len(), 1);
    }

    #[test]
    fn test_ready_up_after_peer_left_all_ready_fires_on_next_ready() {
        // Everyone left standing is ready but no episode was opened.
        let room = room_with(&[(2, "a", true)]);
        let t = ready_up(&code(), Some(&room), conn(2)).unwrap();
        assert!(t.match_started);
    }

    #[test]
    fn test_ready_up_non_player_rejected() {
        let room = room_with(&[(2, "a", false)]);
        let err = ready_up(&code(), Some(&room), conn(7)).unwrap_err();
        assert!(matches!(err, RoomError::NotAPlayer { .. }));

        // The host is not a player either.
        let err = ready_up(&code(), Some(&room), HOST).unwrap_err();
        assert!(matches!(err, RoomError::NotAPlayer { .. }));
    }

    #[test]
    fn test_ready_up_missing_room_not_found() {
        let err = ready_up(&code(), None, conn(2)).unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[test]
    fn test_cancel_ready_clears_latch_and_notifies() {
        let mut room = room_with(&[(2, "a", true), (3, "b", true)]);
        room.all_ready_notified = true;
        let t = cancel_ready(&code(), Some(&room), conn(3)).unwrap();
        let next = saved(&t);
        assert!(!next.players[1].ready);
        assert!(!next.all_ready_notified);
        assert_eq!(
            t.notifications,
            [Notification {
                to: HOST,
                event: ServerEvent::PlayerNotReady {
                    nickname: "b".into()
                }
            }]
        );
    }

    // =====================================================================
    // disconnect / expire / destroy
    // =====================================================================

    #[test]
    fn test_disconnect_host_deletes_room_silently() {
        let room = room_with(&[(2, "a", true), (3, "b", false)]);
        let t = disconnect(&code(), Some(&room), HOST, false).unwrap();
        assert_eq!(t.change, Change::Deleted);
        assert!(t.notifications.is_empty());
        assert_eq!(
            t.bindings,
            [
                Binding::Unbind(HOST),
                Binding::Unbind(conn(2)),
                Binding::Unbind(conn(3))
            ]
        );
    }

    #[test]
    fn test_disconnect_host_ignores_grace() {
        let room = room_with(&[(2, "a", false)]);
        let t = disconnect(&code(), Some(&room), HOST, true).unwrap();
        assert_eq!(t.change, Change::Deleted);
    }

    #[test]
    fn test_disconnect_peer_removes_exactly_one_player() {
        let room = room_with(&[(2, "a", true), (3, "b", false), (4, "c", true)]);
        let t = disconnect(&code(), Some(&room), conn(3), false).unwrap();
        let next = saved(&t);
        assert_eq!(next.players, [room.players[0].clone(), room.players[2].clone()]);
        assert_eq!(
            t.notifications,
            [Notification {
                to: HOST,
                event: ServerEvent::PlayerLeft {
                    nickname: "b".into()
                }
            }]
        );
        assert_eq!(t.bindings, [Binding::Unbind(conn(3))]);
        // Remaining players are all ready, but leaving never fires.
        assert!(!t.match_started);
        assert!(!next.all_ready_notified);
    }

    #[test]
    fn test_disconnect_peer_with_grace_keeps_seat() {
        let room = room_with(&[(2, "a", true)]);
        let t = disconnect(&code(), Some(&room), conn(2), true).unwrap();
        assert_eq!(t.change, Change::Unchanged);
        assert!(t.notifications.is_empty());
        assert_eq!(t.bindings, [Binding::Unbind(conn(2))]);
    }

    #[test]
    fn test_disconnect_unknown_connection_is_invariant_violation() {
        let room = room_with(&[(2, "a", true)]);
        let err = disconnect(&code(), Some(&room), conn(8), false).unwrap_err();
        assert!(matches!(err, RoomError::InvariantViolation(_)));

        let err = disconnect(&code(), None, conn(2), false).unwrap_err();
        assert!(matches!(err, RoomError::InvariantViolation(_)));
    }

    #[test]
    fn test_expire_removes_player_still_on_stale_connection() {
        let room = room_with(&[(2, "a", false), (3, "b", false)]);
        let t = expire(Some(&room), conn(2));
        assert_eq!(saved(&t).players.len(), 1);
        assert_eq!(
            t.notifications[0].event,
            ServerEvent::PlayerLeft {
                nickname: "a".into()
            }
        );
    }

    #[test]
    fn test_expire_after_reconnect_is_noop() {
        // "a" came back on conn 9; the old conn 2 is no longer seated.
        let room = room_with(&[(9, "a", false)]);
        assert_eq!(expire(Some(&room), conn(2)), Transition::unchanged());
        assert_eq!(expire(None, conn(2)), Transition::unchanged());
    }

    #[test]
    fn test_expire_stale_host_tears_room_down() {
        let room = room_with(&[(2, "a", true)]);
        let t = expire(Some(&room), conn(1));
        assert_eq!(t.change, Change::Deleted);
        assert_eq!(t.bindings.len(), 2);
        assert!(t.notifications.is_empty());
    }

    #[test]
    fn test_destroy_deletes_and_unbinds_everyone() {
        let room = room_with(&[(2, "a", false)]);
        let t = destroy(&code(), Some(&room)).unwrap();
        assert_eq!(t.change, Change::Deleted);
        assert_eq!(t.bindings.len(), 2);
        assert!(destroy(&code(), None).is_err());
    }
}
