//! Message routing logic for dispatching client messages to the session layer.

use crate::{
    connection::ConnectionId, error::ServerError, messaging::ClientMessage, session::SyncHub,
};
use tracing::{debug, trace};

/// Routes a raw client text frame to the appropriate handler.
///
/// # Arguments
///
/// * `text` - The raw message text from the client (expected to be JSON)
/// * `connection_id` - The connection the frame arrived on
/// * `hub` - The session hub owning the registry
///
/// # Returns
///
/// `Ok(())` once the message has been handled, including the case where the
/// update was dropped because the sender is no longer registered. A
/// `ServerError::Protocol` is returned for frames that do not decode; the
/// caller logs and discards it.
///
/// The sender id always comes from the connection the frame arrived on,
/// never from the payload, so a client can only ever move its own player.
pub async fn route_client_message(
    text: &str,
    connection_id: ConnectionId,
    hub: &SyncHub,
) -> Result<(), ServerError> {
    let message = ClientMessage::decode(text)?;

    match message {
        ClientMessage::PlayerMovement(update) => {
            trace!("📨 playerMovement from {}: {:?}", connection_id, update);
            if hub.on_movement(connection_id, update).await.is_none() {
                debug!("Dropped movement from unregistered connection {}", connection_id);
            }
        }
    }

    Ok(())
}
