//! Connection management for client connections.
//!
//! This module holds connection identity, the explicit fan-out groups used for
//! broadcasting, the [`BroadcastTransport`] seam the session layer sends
//! through, and the WebSocket-backed [`ConnectionManager`].

pub mod client;
pub mod manager;
pub mod set;
pub mod transport;

pub use manager::ConnectionManager;
pub use set::ConnectionSet;
pub use transport::BroadcastTransport;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Handshake response header carrying the id assigned to the connecting
/// client. Clients use it to find their own entry in `currentPlayers`.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

/// Opaque identity of one client connection.
///
/// Assigned when the connection is accepted and used as the player's id for
/// the lifetime of the connection. Serializes as a plain UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Creates a new random connection id using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
