//! Session lifecycle and state relay.
//!
//! [`SyncHub`] owns the connection registry and is the only code that mutates
//! it. Each operation takes the registry lock, mutates, and queues the
//! resulting notifications before releasing it, so notifications leave in the
//! same order as the registry mutations that caused them. Queuing never
//! blocks (see [`BroadcastTransport`]), so the lock is never held across
//! socket I/O.
//!
//! [`Session`] wraps one connection's `Connected → Disconnected` state
//! machine on top of the hub.

use crate::connection::{BroadcastTransport, ConnectionId};
use crate::error::ServerError;
use crate::messaging::{route_client_message, ServerEvent};
use crate::player::{PlayerSnapshot, PlayerState, PlayerUpdate, SpawnPoint};
use crate::registry::ConnectionRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Join/leave handling and movement fan-out over a single registry.
pub struct SyncHub {
    registry: Mutex<ConnectionRegistry>,
    transport: Arc<dyn BroadcastTransport>,
    spawn: SpawnPoint,
}

impl SyncHub {
    pub fn new(transport: Arc<dyn BroadcastTransport>, spawn: SpawnPoint) -> Self {
        Self {
            registry: Mutex::new(ConnectionRegistry::new()),
            transport,
            spawn,
        }
    }

    /// Registers a newly accepted connection.
    ///
    /// The entry is written before anything is sent, so the joining client's
    /// own snapshot always contains itself and no movement can arrive for an
    /// id that is not yet registered. The snapshot goes only to the joining
    /// connection; `newPlayer` goes to everyone else.
    pub async fn on_connect(&self, id: ConnectionId) -> PlayerState {
        let mut registry = self.registry.lock().await;
        let state = PlayerState::spawn(id, self.spawn);
        registry.put(id, state.clone());

        self.transport
            .send_to(&id, &ServerEvent::CurrentPlayers(registry.snapshot()));
        let notified = self.transport.broadcast_except(
            &registry.connections(),
            id,
            &ServerEvent::NewPlayer(state.clone()),
        );

        info!(
            "👋 Player {} joined at ({}, {}), {} other player(s) notified",
            id, state.x, state.y, notified
        );
        state
    }

    /// Removes a closed connection and tells every remaining connection.
    ///
    /// Calling this twice for the same id broadcasts the departure twice and
    /// is otherwise a no-op; clients ignore departures of unknown ids.
    pub async fn on_disconnect(&self, id: ConnectionId) -> Option<PlayerState> {
        let mut registry = self.registry.lock().await;
        let removed = registry.remove(&id);

        let notified = self
            .transport
            .broadcast_all(&registry.connections(), &ServerEvent::PlayerDisconnected(id));

        if removed.is_some() {
            info!("👋 Player {} left, {} player(s) notified", id, notified);
        } else {
            debug!("Repeated disconnect for {}", id);
        }
        removed
    }

    /// Merges a movement update into the sender's entry and relays the full
    /// merged state to every other connection.
    ///
    /// Returns `None`, and sends nothing, when the sender has no entry. That
    /// happens when a frame races the sender's own disconnect.
    pub async fn on_movement(&self, sender: ConnectionId, update: PlayerUpdate) -> Option<PlayerState> {
        let mut registry = self.registry.lock().await;
        let merged = registry.merge(&sender, &update).cloned()?;

        self.transport.broadcast_except(
            &registry.connections(),
            sender,
            &ServerEvent::PlayerMoved(merged.clone()),
        );
        Some(merged)
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.registry.lock().await.snapshot()
    }

    pub async fn player_count(&self) -> usize {
        self.registry.lock().await.len()
    }
}

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    /// Terminal
    Disconnected,
}

/// One connection's session on a [`SyncHub`].
pub struct Session {
    id: ConnectionId,
    state: SessionState,
    hub: Arc<SyncHub>,
}

impl Session {
    /// Runs the join protocol for `id` and returns the connected session.
    pub async fn open(hub: Arc<SyncHub>, id: ConnectionId) -> Self {
        hub.on_connect(id).await;
        Self {
            id,
            state: SessionState::Connected,
            hub,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handles one inbound text frame. Frames arriving after the session has
    /// closed are ignored.
    pub async fn handle_text(&self, text: &str) -> Result<(), ServerError> {
        if self.state == SessionState::Disconnected {
            return Ok(());
        }
        route_client_message(text, self.id, &self.hub).await
    }

    /// Runs the leave protocol once. Later calls do nothing.
    pub async fn close(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.state = SessionState::Disconnected;
        self.hub.on_disconnect(self.id).await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::connection::{BroadcastTransport, ConnectionId};
    use crate::messaging::ServerEvent;
    use std::sync::Mutex;

    /// Transport that records every queued event in send order.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        sent: Mutex<Vec<(ConnectionId, ServerEvent)>>,
    }

    impl RecordingTransport {
        pub fn sent(&self) -> Vec<(ConnectionId, ServerEvent)> {
            self.sent.lock().expect("recording lock poisoned").clone()
        }

        pub fn sent_to(&self, target: &ConnectionId) -> Vec<ServerEvent> {
            self.sent()
                .into_iter()
                .filter(|(id, _)| id == target)
                .map(|(_, event)| event)
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().expect("recording lock poisoned").clear();
        }

        pub fn is_empty(&self) -> bool {
            self.sent.lock().expect("recording lock poisoned").is_empty()
        }
    }

    impl BroadcastTransport for RecordingTransport {
        fn send_to(&self, target: &ConnectionId, event: &ServerEvent) -> bool {
            self.sent
                .lock()
                .expect("recording lock poisoned")
                .push((*target, event.clone()));
            true
        }
    }
}
