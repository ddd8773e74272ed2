//! Explicit broadcast groups.

use super::ConnectionId;

/// A fixed set of connections taken from the registry's key set.
///
/// Broadcasts are addressed to a `ConnectionSet` rather than to an implicit
/// transport-level room, so the recipients of every notification are exactly
/// the players registered at the moment the set was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSet {
    members: Vec<ConnectionId>,
}

impl ConnectionSet {
    pub fn new(members: impl IntoIterator<Item = ConnectionId>) -> Self {
        members.into_iter().collect()
    }

    /// Every connection in the set.
    pub fn all(&self) -> impl Iterator<Item = &ConnectionId> + '_ {
        self.members.iter()
    }

    /// Every connection in the set except `excluded`.
    pub fn all_except(&self, excluded: ConnectionId) -> impl Iterator<Item = &ConnectionId> + '_ {
        self.members.iter().filter(move |id| **id != excluded)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<ConnectionId> for ConnectionSet {
    fn from_iter<I: IntoIterator<Item = ConnectionId>>(iter: I) -> Self {
        let mut members: Vec<ConnectionId> = iter.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self { members }
    }
}
