//! `LobbyServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → room core,
//! with whatever [`RoomStore`] and [`MatchRecorder`] the caller supplies.

use std::sync::Arc;
use std::time::Duration;

use lobbyforge_protocol::JsonCodec;
use lobbyforge_room::{
    EventRouter, MatchRecorder, RecoveryMode, RoomConfig, RoomStore,
};
use lobbyforge_transport::{Transport, WebSocketTransport};

use crate::LobbyError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<S, M> {
    pub(crate) router: EventRouter<S, M>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Lobbyforge server.
///
/// # Example
///
/// ```rust,no_run
/// use lobbyforge::prelude::*;
///
/// # async fn demo() -> Result<(), LobbyError> {
/// let server = LobbyServerBuilder::new()
///     .bind("0.0.0.0:3003")
///     .recovery(RecoveryMode::Purge)
///     .build(InMemoryRoomStore::new(), InMemoryMatchRecorder::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LobbyServerBuilder {
    bind_addr: String,
    config: RoomConfig,
    recovery: RecoveryMode,
    idle_timeout: Option<Duration>,
}

impl LobbyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3003".to_string(),
            config: RoomConfig::default(),
            recovery: RecoveryMode::default(),
            idle_timeout: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room rules.
    pub fn config(mut self, config: RoomConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets what happens to rooms left in the store by a previous run.
    pub fn recovery(mut self, mode: RecoveryMode) -> Self {
        self.recovery = mode;
        self
    }

    /// Drops connections that send nothing for `timeout`. `None`
    /// (the default) never drops idle connections.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Recovers stored rooms, then binds the listener.
    pub async fn build<S, M>(
        self,
        store: S,
        recorder: M,
    ) -> Result<LobbyServer<S, M>, LobbyError>
    where
        S: RoomStore,
        M: MatchRecorder,
    {
        let router = EventRouter::new(store, recorder, self.config);
        router.recover(self.recovery).await?;

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            router,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(LobbyServer { transport, state })
    }
}

impl Default for LobbyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Lobbyforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LobbyServer<S, M> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, M>>,
}

impl<S: RoomStore, M: MatchRecorder> LobbyServer<S, M> {
    /// Creates a new builder.
    pub fn builder() -> LobbyServerBuilder {
        LobbyServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The router shared by every connection.
    pub fn router(&self) -> &EventRouter<S, M> {
        &self.state.router
    }

    /// Runs the accept loop, spawning one task per connection. Runs
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), LobbyError> {
        tracing::info!("Lobbyforge server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
