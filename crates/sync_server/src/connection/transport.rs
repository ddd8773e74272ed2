//! The send primitives the session layer delivers notifications through.

use super::{ConnectionId, ConnectionSet};
use crate::messaging::ServerEvent;

/// Best-effort, at-most-once delivery of server events.
///
/// Implementations must never block: a send only queues the event for the
/// target connection. Sending to a connection that has already closed is a
/// silent no-op that returns `false`. There is no queuing for connections
/// that are not yet open and no replay.
pub trait BroadcastTransport: Send + Sync {
    /// Queues `event` for a single connection. Returns whether it was queued.
    fn send_to(&self, target: &ConnectionId, event: &ServerEvent) -> bool;

    /// Queues `event` for every member of `group` except `sender`.
    /// Returns the number of connections it was queued for.
    fn broadcast_except(&self, group: &ConnectionSet, sender: ConnectionId, event: &ServerEvent) -> usize {
        group
            .all_except(sender)
            .filter(|target| self.send_to(target, event))
            .count()
    }

    /// Queues `event` for every member of `group`.
    fn broadcast_all(&self, group: &ConnectionSet, event: &ServerEvent) -> usize {
        group
            .all()
            .filter(|target| self.send_to(target, event))
            .count()
    }
}
