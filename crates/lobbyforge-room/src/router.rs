//! The event router: runs lifecycle transitions safely under concurrency.
//!
//! Every room-affecting event follows the same pipeline:
//!
//! ```text
//! parse → lock room → load → lifecycle → persist → registry → record → dispatch → unlock
//! ```
//!
//! Events for one room are serialized by its [`RoomGuard`]; events for
//! different rooms run in parallel. Hosts therefore see notifications for
//! their room in the order the transitions happened.

use std::sync::Arc;
use std::time::Duration;

use lobbyforge_protocol::{ClientEvent, RoomCode, ServerEvent};
use lobbyforge_transport::ConnectionId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::code::{CodeSource, RandomCodes};
use crate::lifecycle::{self, Binding, Change, JoinOutcome, Notification, Transition};
use crate::locks::{RoomGuard, RoomLocks};
use crate::outbox::{EventSender, Outbox};
use crate::store::{ROOM_KEY_PREFIX, StoreError, code_from_key};
use crate::{
    ConnectionRegistry, MatchRecorder, Membership, Role, Room, RoomConfig,
    RoomError, RoomStore,
};

/// What to do with rooms left in the store by a previous process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    /// Delete every stored room. Their connections died with the old
    /// process.
    #[default]
    Purge,
    /// Keep stored rooms and rebuild the connection registry from them,
    /// so returning players can reclaim seats by nickname. Each room is
    /// destroyed once `reconnect_grace` passes, since its host cannot
    /// return.
    Restore,
}

/// Routes client events into room transitions.
///
/// Cheap to clone; all clones share the same rooms, registry and outbox.
pub struct EventRouter<S, M> {
    inner: Arc<Inner<S, M>>,
}

struct Inner<S, M> {
    store: S,
    recorder: M,
    config: RoomConfig,
    codes: Box<dyn CodeSource>,
    registry: Mutex<ConnectionRegistry>,
    locks: RoomLocks,
    outbox: Outbox,
}

impl<S, M> Clone for EventRouter<S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RoomStore, M: MatchRecorder> EventRouter<S, M> {
    /// Creates a router that draws random room codes.
    pub fn new(store: S, recorder: M, config: RoomConfig) -> Self {
        Self::with_code_source(store, recorder, config, RandomCodes)
    }

    /// Creates a router that takes room codes from `codes`.
    pub fn with_code_source(
        store: S,
        recorder: M,
        config: RoomConfig,
        codes: impl CodeSource,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                recorder,
                config,
                codes: Box::new(codes),
                registry: Mutex::new(ConnectionRegistry::new()),
                locks: RoomLocks::new(),
                outbox: Outbox::new(),
            }),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn recorder(&self) -> &M {
        &self.inner.recorder
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Starts delivering events for `conn` into `sender`.
    pub fn register(&self, conn: ConnectionId, sender: EventSender) {
        self.inner.outbox.register(conn, sender);
    }

    /// Stops delivering events for `conn`. From here on its seat counts as
    /// abandoned, even before [`disconnect`](Self::disconnect) runs.
    pub fn unregister(&self, conn: ConnectionId) -> bool {
        self.inner.outbox.unregister(conn)
    }

    /// Sends one event to one connection outside any room transition.
    pub fn send(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        self.inner.outbox.send(conn, event)
    }

    pub fn is_live(&self, conn: ConnectionId) -> bool {
        self.inner.outbox.is_live(conn)
    }

    /// The room and role `conn` is bound to, if any.
    pub fn membership(&self, conn: ConnectionId) -> Option<Membership> {
        self.inner.registry.lock().lookup(conn).cloned()
    }

    /// Dispatches one decoded client event.
    ///
    /// Rejections have already been answered on the connection when this
    /// returns `Err`; the error is for logging.
    pub async fn handle(
        &self,
        conn: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        tracing::debug!(%conn, event = event.name(), "routing event");
        match event {
            ClientEvent::CreateRoom => self.create_room(conn).await.map(|_| ()),
            ClientEvent::RoomJoinRequest {
                room_code,
                nickname,
            } => self
                .join_room(conn, &room_code, &nickname)
                .await
                .map(|_| ()),
            ClientEvent::ReadyToStart { room_code, .. } => {
                self.ready_up(conn, &room_code).await
            }
            ClientEvent::NotReady { room_code } => {
                self.cancel_ready(conn, &room_code).await
            }
            ClientEvent::Heartbeat => {
                self.inner.outbox.send(conn, ServerEvent::HeartbeatAck);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Room events
    // -----------------------------------------------------------------------

    /// Opens a room hosted by `host` under a fresh code.
    pub async fn create_room(
        &self,
        host: ConnectionId,
    ) -> Result<RoomCode, RoomError> {
        if self.membership(host).is_some() {
            return Err(self.reject(host, RoomError::AlreadyInRoom(host)));
        }

        let attempts = self.inner.config.max_code_attempts;
        for _ in 0..attempts {
            let code = self
                .inner
                .codes
                .next_code()
                .map_err(|err| self.reject(host, err.into()))?;

            let guard = self.inner.locks.lock(&code).await;
            if self.load(&code, Some(host)).await?.is_some() {
                tracing::debug!(%code, "room code collision, retrying");
                continue;
            }

            let transition = lifecycle::create(&code, host, &self.inner.config);
            self.commit(&code, Some(host), transition, guard).await?;
            tracing::info!(%code, %host, "room created");
            return Ok(code);
        }

        tracing::error!(attempts, "no free room code");
        Err(self.reject(host, RoomError::CodesExhausted(attempts)))
    }

    /// Seats `conn` in the room `raw_code` as `nickname`.
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        raw_code: &str,
        nickname: &str,
    ) -> Result<JoinOutcome, RoomError> {
        let code = self.parse_code(conn, raw_code)?;

        // One role per connection: hosts can't join, peers can't hop rooms.
        if let Some(membership) = self.membership(conn) {
            if membership.role == Role::Host || membership.code != code {
                return Err(self.reject(conn, RoomError::AlreadyInRoom(conn)));
            }
        }

        let guard = self.inner.locks.lock(&code).await;
        let room = self.load(&code, Some(conn)).await?;
        let outbox = &self.inner.outbox;
        let (transition, outcome) = lifecycle::join(
            &code,
            room.as_ref(),
            conn,
            nickname,
            &self.inner.config,
            |holder| outbox.is_live(holder),
        )
        .map_err(|err| self.reject(conn, err))?;
        self.commit(&code, Some(conn), transition, guard).await?;

        let nickname = nickname.trim();
        match outcome {
            JoinOutcome::Joined => {
                tracing::info!(%code, %conn, nickname, "player joined");
            }
            JoinOutcome::Reconnected { ready } => {
                tracing::info!(%code, %conn, nickname, ready, "player reconnected");
            }
            JoinOutcome::AlreadyJoined => {
                tracing::debug!(%code, %conn, "repeated join request");
            }
        }
        Ok(outcome)
    }

    /// Marks the player on `conn` ready.
    pub async fn ready_up(
        &self,
        conn: ConnectionId,
        raw_code: &str,
    ) -> Result<(), RoomError> {
        let code = self.parse_code(conn, raw_code)?;
        let guard = self.inner.locks.lock(&code).await;
        let room = self.load(&code, Some(conn)).await?;
        let transition = lifecycle::ready_up(&code, room.as_ref(), conn)
            .map_err(|err| self.reject(conn, err))?;
        let started = transition.match_started;
        self.commit(&code, Some(conn), transition, guard).await?;

        if started {
            tracing::info!(%code, "all players ready");
        } else {
            tracing::debug!(%code, %conn, "player ready");
        }
        Ok(())
    }

    /// Marks the player on `conn` not ready.
    pub async fn cancel_ready(
        &self,
        conn: ConnectionId,
        raw_code: &str,
    ) -> Result<(), RoomError> {
        let code = self.parse_code(conn, raw_code)?;
        let guard = self.inner.locks.lock(&code).await;
        let room = self.load(&code, Some(conn)).await?;
        let transition = lifecycle::cancel_ready(&code, room.as_ref(), conn)
            .map_err(|err| self.reject(conn, err))?;
        self.commit(&code, Some(conn), transition, guard).await?;
        tracing::debug!(%code, %conn, "player not ready");
        Ok(())
    }

    /// Cleans up after a closed connection.
    ///
    /// Safe to call for connections that never joined anything, and more
    /// than once.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.inner.outbox.unregister(conn);

        let Some(membership) = self.membership(conn) else {
            tracing::debug!(%conn, "connection closed outside any room");
            return Ok(());
        };
        let code = membership.code.clone();

        let guard = self.inner.locks.lock(&code).await;
        // A reconnect may have taken the seat while we waited.
        if self.membership(conn).as_ref() != Some(&membership) {
            tracing::debug!(%code, %conn, "disconnect superseded");
            return Ok(());
        }

        let room = self.load(&code, None).await?;
        let grace = self.inner.config.reconnect_grace;
        let keep_seat = membership.role == Role::Peer && !grace.is_zero();

        let transition =
            match lifecycle::disconnect(&code, room.as_ref(), conn, keep_seat) {
                Ok(transition) => transition,
                Err(err) => {
                    tracing::warn!(%code, %conn, error = %err, "dropping stale registry entry");
                    self.inner.registry.lock().unbind(conn);
                    return Err(err);
                }
            };
        let destroyed = transition.change == Change::Deleted;
        self.commit(&code, None, transition, guard).await?;

        if destroyed {
            tracing::info!(%code, %conn, "host left, room destroyed");
        } else if keep_seat {
            tracing::info!(%code, %conn, grace_ms = grace.as_millis() as u64, "player dropped, holding seat");
            self.schedule_expiry(code, conn, grace);
        } else {
            tracing::info!(%code, %conn, "player left");
        }
        Ok(())
    }

    /// Deletes a room and unbinds everyone in it. Nobody is notified.
    pub async fn destroy_room(&self, code: &RoomCode) -> Result<(), RoomError> {
        let guard = self.inner.locks.lock(code).await;
        let room = self.load(code, None).await?;
        let transition = lifecycle::destroy(code, room.as_ref())?;
        self.commit(code, None, transition, guard).await?;
        tracing::info!(%code, "room destroyed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Startup and inspection
    // -----------------------------------------------------------------------

    /// Deals with rooms left over from a previous run. Returns how many
    /// rooms were purged, or how many restored rooms are being held for
    /// returning players.
    pub async fn recover(&self, mode: RecoveryMode) -> Result<usize, RoomError> {
        let keys = self.inner.store.list_keys(ROOM_KEY_PREFIX).await?;
        let codes = keys.iter().filter_map(|key| {
            let code = code_from_key(key);
            if code.is_none() {
                tracing::warn!(key, "skipping malformed room key");
            }
            code
        });

        match mode {
            RecoveryMode::Purge => {
                let mut purged = 0;
                for code in codes {
                    self.inner.store.delete(&code).await?;
                    purged += 1;
                }
                tracing::info!(rooms = purged, "purged stale rooms");
                Ok(purged)
            }
            RecoveryMode::Restore => {
                let mut rooms = Vec::new();
                for code in codes {
                    match self.inner.store.get(&code).await {
                        Ok(Some(room)) => rooms.push((code, room)),
                        Ok(None) => {}
                        Err(StoreError::Serialization(err)) => {
                            tracing::warn!(%code, error = %err, "skipping unreadable room");
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                self.inner
                    .registry
                    .lock()
                    .rebuild(rooms.iter().map(|(code, room)| (code, room)));

                // Hosts died with the old process and cannot come back, so
                // each restored room only lives out one grace period.
                let grace = self.inner.config.reconnect_grace;
                let mut held = 0;
                for (code, room) in rooms {
                    if grace.is_zero() {
                        self.expire(&code, room.host).await?;
                    } else {
                        self.schedule_expiry(code, room.host, grace);
                        held += 1;
                    }
                }
                tracing::info!(rooms = held, grace_ms = grace.as_millis() as u64, "restored rooms");
                Ok(held)
            }
        }
    }

    /// Loads a room straight from the store.
    pub async fn room(&self, code: &RoomCode) -> Result<Option<Room>, RoomError> {
        Ok(self.inner.store.get(code).await?)
    }

    /// Number of rooms in the store.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        Ok(self.inner.store.list_keys(ROOM_KEY_PREFIX).await?.len())
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn parse_code(
        &self,
        conn: ConnectionId,
        raw: &str,
    ) -> Result<RoomCode, RoomError> {
        RoomCode::parse(raw).map_err(|_| {
            self.reject(conn, RoomError::NotFound(raw.trim().to_string()))
        })
    }

    /// Answers `conn` with the error's reply event and hands it back.
    fn reject(&self, conn: ConnectionId, err: RoomError) -> RoomError {
        tracing::debug!(%conn, error = %err, "request rejected");
        if let Some(event) = err.reply_event() {
            self.inner.outbox.send(conn, event);
        }
        err
    }

    async fn load(
        &self,
        code: &RoomCode,
        requester: Option<ConnectionId>,
    ) -> Result<Option<Room>, RoomError> {
        match self.inner.store.get(code).await {
            Ok(room) => Ok(room),
            Err(err) => {
                tracing::error!(%code, error = %err, "failed to load room");
                if let Some(conn) = requester {
                    self.inner.outbox.send(conn, ServerEvent::ErrorUnavailable);
                }
                Err(err.into())
            }
        }
    }

    /// Applies a transition while `guard` is held, then releases it.
    async fn commit(
        &self,
        code: &RoomCode,
        requester: Option<ConnectionId>,
        transition: Transition,
        guard: RoomGuard,
    ) -> Result<(), RoomError> {
        let Transition {
            change,
            notifications,
            bindings,
            match_started,
        } = transition;

        let deleted = change == Change::Deleted;
        let persisted = match &change {
            Change::Unchanged => Ok(()),
            Change::Saved(room) => self.inner.store.put(code, room).await,
            Change::Deleted => self.inner.store.delete(code).await,
        };
        if let Err(err) = persisted {
            tracing::error!(%code, error = %err, "failed to persist room");
            if let Some(conn) = requester {
                self.inner.outbox.send(conn, ServerEvent::ErrorUnavailable);
            }
            return Err(err.into());
        }

        {
            let mut registry = self.inner.registry.lock();
            if deleted {
                let released = registry.unbind_room(code);
                tracing::debug!(%code, connections = released.len(), "room bindings released");
            }
            for binding in bindings {
                match binding {
                    Binding::Bind { connection, role } => {
                        registry.bind(connection, code.clone(), role);
                    }
                    Binding::Unbind(connection) => {
                        let here = registry
                            .lookup(connection)
                            .is_some_and(|m| &m.code == code);
                        if here {
                            registry.unbind(connection);
                        }
                    }
                }
            }
        }

        if match_started {
            match self.inner.recorder.record_start(code).await {
                Ok(()) => tracing::info!(%code, "match start recorded"),
                Err(err) => {
                    tracing::error!(%code, error = %err, "failed to record match start");
                }
            }
        }

        for Notification { to, event } in notifications {
            self.inner.outbox.send(to, event);
        }

        drop(guard);
        Ok(())
    }

    fn schedule_expiry(&self, code: RoomCode, stale: ConnectionId, grace: Duration) {
        let router = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Err(err) = router.expire(&code, stale).await {
                tracing::warn!(%code, conn = %stale, error = %err, "seat expiry failed");
            }
        });
    }

    async fn expire(
        &self,
        code: &RoomCode,
        stale: ConnectionId,
    ) -> Result<(), RoomError> {
        let guard = self.inner.locks.lock(code).await;
        let room = self.load(code, None).await?;
        let transition = lifecycle::expire(room.as_ref(), stale);
        let change = match &transition.change {
            Change::Unchanged => None,
            Change::Saved(_) => Some("player removed"),
            Change::Deleted => Some("host gone, room destroyed"),
        };
        self.commit(code, None, transition, guard).await?;
        if let Some(outcome) = change {
            tracing::info!(%code, conn = %stale, outcome, "reconnect grace expired");
        }
        Ok(())
    }
}
