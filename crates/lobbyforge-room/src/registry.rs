//! Connection → room index.
//!
//! Answers "which room is this connection in, and as what?" in O(1), so a
//! disconnect never scans rooms. The index is advisory: the router always
//! re-validates against the stored room under its lock.

use std::collections::{HashMap, HashSet};

use lobbyforge_protocol::RoomCode;
use lobbyforge_transport::ConnectionId;

use crate::Room;

/// How a connection takes part in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Peer,
}

/// A connection's room and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub code: RoomCode,
    pub role: Role,
}

/// Maps each connection to at most one room.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: HashMap<ConnectionId, Membership>,
    /// Reverse index so a destroyed room unbinds everyone in O(members).
    rooms: HashMap<RoomCode, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn` to `code`, replacing any previous binding.
    pub fn bind(
        &mut self,
        conn: ConnectionId,
        code: RoomCode,
        role: Role,
    ) -> Option<Membership> {
        let previous = self.unbind(conn);
        self.rooms.entry(code.clone()).or_default().insert(conn);
        self.members.insert(conn, Membership { code, role });
        previous
    }

    /// Drops `conn`'s binding, returning it.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<Membership> {
        let membership = self.members.remove(&conn)?;
        if let Some(set) = self.rooms.get_mut(&membership.code) {
            set.remove(&conn);
            if set.is_empty() {
                self.rooms.remove(&membership.code);
            }
        }
        Some(membership)
    }

    pub fn lookup(&self, conn: ConnectionId) -> Option<&Membership> {
        self.members.get(&conn)
    }

    /// Unbinds every connection of `code`, returning them.
    pub fn unbind_room(&mut self, code: &RoomCode) -> Vec<ConnectionId> {
        let conns: Vec<_> = self
            .rooms
            .remove(code)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for conn in &conns {
            self.members.remove(conn);
        }
        conns
    }

    /// Replaces the whole index with the bindings implied by `rooms`.
    pub fn rebuild<'a>(
        &mut self,
        rooms: impl IntoIterator<Item = (&'a RoomCode, &'a Room)>,
    ) {
        self.members.clear();
        self.rooms.clear();
        for (code, room) in rooms {
            self.bind(room.host, code.clone(), Role::Host);
            for player in &room.players {
                self.bind(player.connection_id, code.clone(), Role::Peer);
            }
        }
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn code(raw: &str) -> RoomCode {
        RoomCode::parse(raw).unwrap()
    }

    #[test]
    fn test_bind_and_lookup() {
        let mut reg = ConnectionRegistry::new();
        reg.bind(conn(1), code("AAAA"), Role::Host);
        let m = reg.lookup(conn(1)).unwrap();
        assert_eq!(m.code, code("AAAA"));
        assert_eq!(m.role, Role::Host);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_bind_replaces_previous_room() {
        let mut reg = ConnectionRegistry::new();
        reg.bind(conn(2), code("AAAA"), Role::Peer);
        let previous = reg.bind(conn(2), code("BBBB"), Role::Peer).unwrap();
        assert_eq!(previous.code, code("AAAA"));
        assert_eq!(reg.len(), 1);
        // The old room's index no longer lists the connection.
        assert!(reg.unbind_room(&code("AAAA")).is_empty());
    }

    #[test]
    fn test_unbind_unknown_returns_none() {
        let mut reg = ConnectionRegistry::new();
        assert!(reg.unbind(conn(9)).is_none());
    }

    #[test]
    fn test_unbind_room_removes_all_members() {
        let mut reg = ConnectionRegistry::new();
        reg.bind(conn(1), code("AAAA"), Role::Host);
        reg.bind(conn(2), code("AAAA"), Role::Peer);
        reg.bind(conn(3), code("BBBB"), Role::Host);

        let mut removed = reg.unbind_room(&code("AAAA"));
        removed.sort();
        assert_eq!(removed, [conn(1), conn(2)]);
        assert!(reg.lookup(conn(1)).is_none());
        assert!(reg.lookup(conn(3)).is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_rebuild_from_rooms() {
        let mut reg = ConnectionRegistry::new();
        reg.bind(conn(99), code("ZZZZ"), Role::Host);

        let mut room = Room::new(conn(1), 6);
        room.players.push(Player::new(conn(2), "ada"));
        let c = code("ABCD");
        reg.rebuild([(&c, &room)]);

        assert!(reg.lookup(conn(99)).is_none(), "stale bindings cleared");
        assert_eq!(reg.lookup(conn(1)).unwrap().role, Role::Host);
        assert_eq!(reg.lookup(conn(2)).unwrap().role, Role::Peer);
        assert_eq!(reg.len(), 2);
    }
}
