//! Error types and handling for the sync server.
//!
//! None of these errors ever reach a client. Per-message failures are logged
//! and dropped by the connection handler; only startup failures such as a
//! failed bind propagate out of [`crate::SyncServer::start`].

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or handshake issues
    #[error("Network error: {0}")]
    Network(String),

    /// A frame that could not be encoded or decoded as a protocol message
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}
