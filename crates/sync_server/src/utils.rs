//! Factory functions for creating server instances.

use crate::{config::ServerConfig, server::SyncServer};

/// Creates a new sync server with default configuration.
///
/// # Example
///
/// ```rust
/// use sync_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().spawn.x, 100.0);
/// ```
pub fn create_server() -> SyncServer {
    SyncServer::new(ServerConfig::default())
}

/// Creates a new sync server with custom configuration.
///
/// # Example
///
/// ```rust
/// use sync_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     max_connections: 5000,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> SyncServer {
    SyncServer::new(config)
}
