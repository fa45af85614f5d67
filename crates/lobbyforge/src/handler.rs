//! Per-connection handler: event decoding and delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbox channel with the router
//!   2. Spawn a writer task draining that channel onto the socket
//!   3. Loop: receive frames → decode `ClientEvent` → `router.handle`
//!   4. On exit, the drop guard unregisters the outbox and runs
//!      `router.disconnect`

use std::sync::Arc;

use lobbyforge_protocol::{ClientEvent, Codec, JsonCodec, ServerEvent};
use lobbyforge_room::{EventRouter, MatchRecorder, RoomStore};
use lobbyforge_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::LobbyError;
use crate::server::ServerState;

/// Drop guard that resolves the connection's room membership when the
/// handler exits.
///
/// This runs on every exit path, panics included. The outbox entry goes
/// right away so a quick rejoin can reclaim the seat; since `Drop` is
/// synchronous, the async disconnect is spawned onto the runtime.
struct DisconnectGuard<S: RoomStore, M: MatchRecorder> {
    conn: ConnectionId,
    router: EventRouter<S, M>,
}

impl<S: RoomStore, M: MatchRecorder> Drop for DisconnectGuard<S, M> {
    fn drop(&mut self) {
        let conn = self.conn;
        self.router.unregister(conn);
        let router = self.router.clone();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            if let Err(e) = router.disconnect(conn).await {
                tracing::warn!(%conn, error = %e, "disconnect cleanup failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, M>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, M>>,
) -> Result<(), LobbyError>
where
    S: RoomStore,
    M: MatchRecorder,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    state.router.register(conn_id, tx);
    let _guard = DisconnectGuard {
        conn: conn_id,
        router: state.router.clone(),
    };

    tokio::spawn(write_events(Arc::clone(&conn), rx, state.codec));

    let result = read_events(&conn, &state).await;

    // Best effort: the peer may already be gone.
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }

    // _guard drops here → the outbox sender goes away, the writer task
    // ends and disconnect fires.
    result
}

/// Reads frames until the connection closes, fails or idles out.
async fn read_events<S, M>(
    conn: &WebSocketConnection,
    state: &ServerState<S, M>,
) -> Result<(), LobbyError>
where
    S: RoomStore,
    M: MatchRecorder,
{
    let conn_id = conn.id();

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    return Ok(());
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                state.router.send(
                    conn_id,
                    ServerEvent::ErrorBadRequest {
                        message: e.to_string(),
                    },
                );
                continue;
            }
        };

        // Rejections were already answered on the connection; the error
        // only needs logging here.
        if let Err(e) = state.router.handle(conn_id, event).await {
            if e.is_client_error() {
                tracing::debug!(%conn_id, error = %e, "event rejected");
            } else {
                tracing::warn!(%conn_id, error = %e, "event failed");
            }
        }
    }
}

/// Encodes queued events and writes them to the socket, in order.
async fn write_events(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    codec: JsonCodec,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobbyforge_room::{
        InMemoryMatchRecorder, InMemoryRoomStore, JoinOutcome, RoomConfig,
    };
    use std::time::Duration;

    type Router = EventRouter<InMemoryRoomStore, InMemoryMatchRecorder>;

    fn router() -> Router {
        EventRouter::new(
            InMemoryRoomStore::new(),
            InMemoryMatchRecorder::new(),
            RoomConfig {
                reconnect_grace: Duration::from_secs(30),
                ..RoomConfig::default()
            },
        )
    }

    #[test]
    fn test_disconnect_guard_drop_ends_liveness_without_runtime() {
        let router = router();
        let conn = ConnectionId::new(7);
        let (tx, _rx) = mpsc::unbounded_channel();
        router.register(conn, tx);

        drop(DisconnectGuard {
            conn,
            router: router.clone(),
        });
        assert!(!router.is_live(conn));
    }

    #[tokio::test]
    async fn test_disconnect_guard_drop_frees_seat_before_cleanup_runs() {
        let router = router();
        let host = ConnectionId::new(1);
        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        router.register(host, host_tx);
        let code = router.create_room(host).await.unwrap();

        let old = ConnectionId::new(2);
        // The writer task still holds the receiver.
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        router.register(old, old_tx);
        router.join_room(old, code.as_str(), "ada").await.unwrap();

        drop(DisconnectGuard {
            conn: old,
            router: router.clone(),
        });

        // The spawned cleanup has not run on this single-threaded runtime.
        let new = ConnectionId::new(3);
        let (new_tx, _new_rx) = mpsc::unbounded_channel();
        router.register(new, new_tx);
        let outcome = router.join_room(new, code.as_str(), "ada").await.unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected { ready: false });
    }
}
