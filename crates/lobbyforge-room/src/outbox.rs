//! Outbound event delivery, one channel per open connection.
//!
//! The connection handler registers a sender when a socket is accepted
//! and a writer task drains the matching receiver. A connection is *live*
//! exactly while its sender is registered and its receiver still exists.

use std::collections::HashMap;

use lobbyforge_protocol::ServerEvent;
use lobbyforge_transport::ConnectionId;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Channel sender for delivering events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Default)]
pub struct Outbox {
    senders: Mutex<HashMap<ConnectionId, EventSender>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn: ConnectionId, sender: EventSender) {
        self.senders.lock().insert(conn, sender);
    }

    /// Forgets `conn`. Returns `false` if it was not registered.
    pub fn unregister(&self, conn: ConnectionId) -> bool {
        self.senders.lock().remove(&conn).is_some()
    }

    /// `true` while `conn` can still receive events.
    pub fn is_live(&self, conn: ConnectionId) -> bool {
        self.senders
            .lock()
            .get(&conn)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Queues `event` for `conn`. Events for unknown or closed
    /// connections are dropped; their disconnect is already on its way.
    pub fn send(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        let name = event.name();
        let delivered = self
            .senders
            .lock()
            .get(&conn)
            .is_some_and(|tx| tx.send(event).is_ok());
        if delivered {
            tracing::debug!(%conn, event = name, "event queued");
        } else {
            tracing::debug!(%conn, event = name, "dropping event for closed connection");
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_send_to_registered_connection() {
        let outbox = Outbox::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        outbox.register(conn(1), tx);

        assert!(outbox.send(conn(1), ServerEvent::HeartbeatAck));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::HeartbeatAck);
    }

    #[test]
    fn test_send_to_unknown_connection_dropped() {
        let outbox = Outbox::new();
        assert!(!outbox.send(conn(1), ServerEvent::AllReady));
    }

    #[test]
    fn test_is_live_false_after_receiver_dropped() {
        let outbox = Outbox::new();
        let (tx, rx) = mpsc::unbounded_channel();
        outbox.register(conn(1), tx);
        assert!(outbox.is_live(conn(1)));

        drop(rx);
        assert!(!outbox.is_live(conn(1)));
        assert!(!outbox.send(conn(1), ServerEvent::AllReady));
    }

    #[test]
    fn test_unregister_ends_liveness() {
        let outbox = Outbox::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        outbox.register(conn(1), tx);
        assert_eq!(outbox.len(), 1);

        assert!(outbox.unregister(conn(1)));
        assert!(!outbox.unregister(conn(1)));
        assert!(!outbox.is_live(conn(1)));
        assert!(outbox.is_empty());
    }
}
