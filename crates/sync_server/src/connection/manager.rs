//! Connection manager for tracking and messaging client connections.
//!
//! This module provides the central table of open WebSocket connections and
//! the [`BroadcastTransport`] implementation that delivers server events to
//! them.

use super::client::{ClientConnection, Outbound};
use super::{BroadcastTransport, ConnectionId, ConnectionSet};
use crate::error::ServerError;
use crate::messaging::ServerEvent;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace};

/// Central manager for all client connections.
///
/// The `ConnectionManager` assigns connection ids, enforces the connection
/// limit and owns the outbound queue of every open connection. It knows
/// nothing about players: which connections receive a broadcast is decided by
/// the caller through a [`ConnectionSet`].
///
/// # Architecture
///
/// * Uses a `DashMap` so per-connection sends never contend on a global lock
/// * Reserves capacity atomically before a connection is inserted
/// * Every send is a non-blocking push onto an unbounded queue
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: DashMap<ConnectionId, ClientConnection>,

    /// Number of reserved connection slots
    active: AtomicUsize,

    /// Maximum number of concurrent connections allowed
    max_connections: usize,
}

impl ConnectionManager {
    /// Creates a new connection manager that admits at most
    /// `max_connections` concurrent connections.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: DashMap::new(),
            active: AtomicUsize::new(0),
            max_connections,
        }
    }

    /// Registers a connection under the id handed to the client during the
    /// handshake.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - The id already announced to the client
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbound` - The queue feeding this connection's writer task
    ///
    /// # Returns
    ///
    /// A `ServerError::Network` if the server is already at its connection
    /// limit or the id is already registered.
    pub fn add_connection(
        &self,
        connection_id: ConnectionId,
        remote_addr: SocketAddr,
        outbound: Outbound,
    ) -> Result<(), ServerError> {
        let reserved = self.active.fetch_add(1, Ordering::AcqRel);
        if reserved >= self.max_connections {
            self.active.fetch_sub(1, Ordering::AcqRel);
            return Err(ServerError::Network(format!(
                "connection limit of {} reached",
                self.max_connections
            )));
        }

        match self.connections.entry(connection_id) {
            Entry::Occupied(_) => {
                self.active.fetch_sub(1, Ordering::AcqRel);
                Err(ServerError::Network(format!(
                    "connection {connection_id} is already registered"
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(ClientConnection::new(remote_addr, outbound));
                info!("🔗 Connection {} from {}", connection_id, remote_addr);
                Ok(())
            }
        }
    }

    /// Removes a connection from the manager. Safe to call more than once.
    pub fn remove_connection(&self, connection_id: ConnectionId) {
        if let Some((_, connection)) = self.connections.remove(&connection_id) {
            self.active.fetch_sub(1, Ordering::AcqRel);
            info!(
                "❌ Connection {} from {} disconnected after {:.1?}",
                connection_id,
                connection.remote_addr,
                connection.connected_at.elapsed()
            );
        }
    }

    /// Queues a raw frame for one connection.
    pub fn send_message(&self, connection_id: &ConnectionId, message: Message) -> bool {
        match self.connections.get(connection_id) {
            Some(connection) => {
                let queued = connection.send(message);
                if !queued {
                    trace!("Dropped frame for closing connection {}", connection_id);
                }
                queued
            }
            None => {
                trace!("Dropped frame for unknown connection {}", connection_id);
                false
            }
        }
    }

    /// Sends a close frame to every open connection.
    ///
    /// Each connection's handler finishes its own cleanup once the client
    /// acknowledges the close.
    pub fn close_all(&self, reason: &str) -> usize {
        let mut closed = 0;
        for connection in self.connections.iter() {
            let frame = CloseFrame {
                code: CloseCode::Away,
                reason: reason.to_string().into(),
            };
            if connection.send(Message::Close(Some(frame))) {
                closed += 1;
            }
        }
        debug!("Sent close frame to {} connections", closed);
        closed
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections
            .get(connection_id)
            .is_some_and(|connection| connection.is_open())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    fn encode(event: &ServerEvent) -> Option<Message> {
        match event.encode() {
            Ok(text) => Some(Message::text(text)),
            Err(e) => {
                error!("Failed to encode {} event: {}", event.name(), e);
                None
            }
        }
    }
}

impl BroadcastTransport for ConnectionManager {
    fn send_to(&self, target: &ConnectionId, event: &ServerEvent) -> bool {
        match Self::encode(event) {
            Some(frame) => self.send_message(target, frame),
            None => false,
        }
    }

    // The broadcast variants encode once and clone the frame per recipient.

    fn broadcast_except(&self, group: &ConnectionSet, sender: ConnectionId, event: &ServerEvent) -> usize {
        let Some(frame) = Self::encode(event) else {
            return 0;
        };
        let delivered = group
            .all_except(sender)
            .filter(|target| self.send_message(target, frame.clone()))
            .count();
        debug!("📡 Broadcasted {} to {} connections", event.name(), delivered);
        delivered
    }

    fn broadcast_all(&self, group: &ConnectionSet, event: &ServerEvent) -> usize {
        let Some(frame) = Self::encode(event) else {
            return 0;
        };
        let delivered = group
            .all()
            .filter(|target| self.send_message(target, frame.clone()))
            .count();
        debug!("📡 Broadcasted {} to {} connections", event.name(), delivered);
        delivered
    }
}
