//! Message type definitions for client-server communication.
//!
//! Every frame is a JSON text frame pairing an event name with its payload:
//!
//! ```json
//! { "event": "playerMovement", "data": { "x": 120.0, "y": 100.0 } }
//! ```
//!
//! There is no versioning field and no framing beyond the event/data pair.

use crate::connection::ConnectionId;
use crate::player::{PlayerSnapshot, PlayerState, PlayerUpdate};
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Incremental state update for the sender's own player
    PlayerMovement(PlayerUpdate),
}

impl ClientMessage {
    /// Decodes a text frame. Unknown events and payloads that do not fit the
    /// schema are rejected; unknown fields inside a payload are dropped.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A notification sent from the server to one or more clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full snapshot, unicast to a client when it connects
    CurrentPlayers(PlayerSnapshot),

    /// A player joined; sent to everyone except the new player
    NewPlayer(PlayerState),

    /// A player's state after merging an update; sent to everyone except the mover
    PlayerMoved(PlayerState),

    /// A player left; sent to every remaining connection
    PlayerDisconnected(ConnectionId),
}

impl ServerEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CurrentPlayers(_) => "currentPlayers",
            Self::NewPlayer(_) => "newPlayer",
            Self::PlayerMoved(_) => "playerMoved",
            Self::PlayerDisconnected(_) => "playerDisconnected",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
