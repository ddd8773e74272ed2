//! The connection registry: the authoritative map of connection → player.
//!
//! The registry itself does no locking. [`crate::SyncHub`] owns the single
//! instance and serializes every access behind one mutex, so the methods here
//! are plain `&self`/`&mut self` operations.

use crate::connection::{ConnectionId, ConnectionSet};
use crate::player::{PlayerSnapshot, PlayerState, PlayerUpdate};
use std::collections::HashMap;

/// Mapping from connection identity to that connection's player state.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    players: HashMap<ConnectionId, PlayerState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `id`.
    pub fn put(&mut self, id: ConnectionId, state: PlayerState) {
        debug_assert_eq!(id, state.id, "player state keyed under a foreign connection");
        self.players.insert(id, state);
    }

    /// Shallow-merges `update` into the entry for `id` and returns the merged
    /// entry. Returns `None` without touching anything if `id` is unknown.
    pub fn merge(&mut self, id: &ConnectionId, update: &PlayerUpdate) -> Option<&PlayerState> {
        let state = self.players.get_mut(id)?;
        state.apply(update);
        Some(state)
    }

    /// Removes the entry for `id`, returning it if it existed.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<PlayerState> {
        self.players.remove(id)
    }

    /// Returns an owned copy of every entry.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.players.clone()
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The current key set, used as the fan-out group for broadcasts.
    pub fn connections(&self) -> ConnectionSet {
        self.players.keys().copied().collect()
    }
}
