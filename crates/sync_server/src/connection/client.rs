//! Client connection representation.

use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Queue of frames waiting to be written to one client's socket.
pub type Outbound = mpsc::UnboundedSender<Message>;

/// Represents an individual client connection to the server.
///
/// Holds the sending half of the connection's outbound queue; the receiving
/// half is drained by the writer task spawned in
/// [`crate::server::handlers::handle_connection`].
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was registered
    pub connected_at: Instant,

    outbound: Outbound,
}

impl ClientConnection {
    pub fn new(remote_addr: SocketAddr, outbound: Outbound) -> Self {
        Self {
            remote_addr,
            connected_at: Instant::now(),
            outbound,
        }
    }

    /// Queues a frame for this client. Returns `false` once the writer task
    /// has gone away.
    pub fn send(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }

    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}
