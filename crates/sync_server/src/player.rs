//! Player state and the partial updates clients send to mutate it.
//!
//! The wire schema is closed: a [`PlayerUpdate`] only carries position and
//! the enumerated movement metadata. Unknown fields are dropped when the
//! message is decoded, so a client cannot grow the server-side state.

use crate::connection::ConnectionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time copy of every registered player, keyed by connection.
pub type PlayerSnapshot = HashMap<ConnectionId, PlayerState>;

/// Facing direction of a player sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// Position every new player starts at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f64,
    pub y: f64,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self { x: 100.0, y: 100.0 }
    }
}

/// The replicated state of one connected player.
///
/// `id` always equals the owning connection's identity and is never changed
/// by an update; only the connection that owns the entry can move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: ConnectionId,
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    pub is_moving: bool,
}

impl PlayerState {
    /// Creates the default state for a freshly connected player.
    pub fn spawn(id: ConnectionId, spawn: SpawnPoint) -> Self {
        Self {
            id,
            x: spawn.x,
            y: spawn.y,
            direction: Direction::default(),
            is_moving: false,
        }
    }

    /// Applies a partial update field by field. Absent fields keep their
    /// current value.
    pub fn apply(&mut self, update: &PlayerUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(direction) = update.direction {
            self.direction = direction;
        }
        if let Some(is_moving) = update.is_moving {
            self.is_moving = is_moving;
        }
    }
}

/// Incremental state sent by a client in a `playerMovement` message.
///
/// ```json
/// { "x": 120.0, "y": 100.0, "direction": "left", "isMoving": true }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
}

impl PlayerUpdate {
    /// A position-only update, the shape most clients send every frame.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.direction.is_none() && self.is_moving.is_none()
    }
}
