//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize the sync server.

use crate::player::SpawnPoint;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration structure for the sync server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Largest inbound WebSocket message accepted, in bytes
    pub max_message_size: usize,

    /// Where newly connected players appear
    pub spawn: SpawnPoint,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".parse().expect("Invalid default bind address"),
            max_connections: 1000,
            max_message_size: 64 * 1024, // 64KB
            spawn: SpawnPoint::default(),
        }
    }
}
