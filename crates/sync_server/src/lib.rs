//! # Sync Server - Realtime Position Synchronization
//!
//! A WebSocket server that tracks every connected player's 2D state and relays
//! each change to all other connected players.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Connection Registry** ([`ConnectionRegistry`]) - connection id → [`PlayerState`]
//! * **Sync Hub** ([`SyncHub`]) - join/leave protocol and movement relay, sole owner of the registry
//! * **Broadcast Transport** ([`BroadcastTransport`]) - `send_to`, `broadcast_except`,
//!   `broadcast_all` over an explicit [`ConnectionSet`]
//! * **Connection Manager** ([`ConnectionManager`]) - WebSocket outbound queues and connection limit
//!
//! ### Message Flow
//!
//! 1. A client connects; it receives `currentPlayers` and everyone else receives `newPlayer`
//! 2. The client sends `playerMovement` with a partial state
//! 3. The hub merges it and sends the merged state as `playerMoved` to everyone else
//! 4. On close, the entry is removed and everyone left receives `playerDisconnected`
//!
//! The connection id is returned to the client in the `x-connection-id`
//! header of the handshake response, before any frame is sent.
//!
//! Frames are JSON text frames of the form `{"event": ..., "data": ...}`; see
//! [`messaging::types`].
//!
//! ## Trust Model
//!
//! The server trusts client-reported positions. Updates are merged and relayed
//! without range, speed or teleport checks.

pub use config::ServerConfig;
pub use connection::{
    BroadcastTransport, ConnectionId, ConnectionManager, ConnectionSet, CONNECTION_ID_HEADER,
};
pub use error::ServerError;
pub use messaging::{ClientMessage, ServerEvent};
pub use player::{Direction, PlayerSnapshot, PlayerState, PlayerUpdate, SpawnPoint};
pub use registry::ConnectionRegistry;
pub use server::SyncServer;
pub use session::{Session, SessionState, SyncHub};
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod player;
pub mod registry;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod utils;

mod tests;
