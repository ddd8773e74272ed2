//! Core sync server implementation.
//!
//! This module contains the main `SyncServer` struct: it binds the listener,
//! runs the accept loop, and owns the connection manager and session hub that
//! every connection task shares.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::handlers::handle_connection,
    session::SyncHub,
    shutdown::ShutdownState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, Instrument};

/// The core sync server structure.
///
/// # Architecture
///
/// * **Connection Manager**: outbound queues and the connection limit
/// * **Sync Hub**: the registry plus the join, leave and movement protocols
/// * **Accept loop**: one task per connection, stopped by a [`ShutdownState`]
pub struct SyncServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Manager for client connections and messaging
    connection_manager: Arc<ConnectionManager>,

    /// Owner of the player registry
    hub: Arc<SyncHub>,

    /// Internal shutdown signal, triggered by [`SyncServer::shutdown`]
    shutdown_state: ShutdownState,
}

impl SyncServer {
    /// Creates a new sync server with the specified configuration.
    ///
    /// The connection manager doubles as the hub's broadcast transport.
    pub fn new(config: ServerConfig) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new(config.max_connections));
        let hub = Arc::new(SyncHub::new(connection_manager.clone(), config.spawn));

        Self {
            config,
            connection_manager,
            hub,
            shutdown_state: ShutdownState::new(),
        }
    }

    /// Binds the configured address and serves until [`SyncServer::shutdown`]
    /// is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    /// Binds the configured address and serves until either the given
    /// shutdown state or the internal one is triggered.
    pub async fn start_with_shutdown_state(&self, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting sync server on {}", self.config.bind_address);
        let listener = self.bind().await?;
        self.serve(listener, shutdown_state).await
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address)))
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// On shutdown the loop stops accepting and every open connection is sent
    /// a close frame; each connection task then runs its own leave protocol.
    pub async fn serve(&self, listener: TcpListener, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        info!("🎮 Accepting connections on {}", local_addr);

        let external_shutdown = async {
            match &shutdown_state {
                Some(state) => state.wait_for_shutdown().await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(external_shutdown);

        loop {
            tokio::select! {
                _ = self.shutdown_state.wait_for_shutdown() => break,
                _ = &mut external_shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        let connection_manager = self.connection_manager.clone();
                        let hub = self.hub.clone();
                        let max_message_size = self.config.max_message_size;

                        // Spawn individual connection handler
                        tokio::spawn(
                            async move {
                                if let Err(e) = handle_connection(
                                    stream,
                                    addr,
                                    connection_manager,
                                    hub,
                                    max_message_size,
                                )
                                .await
                                {
                                    error!("Connection error: {}", e);
                                }
                            }
                            .instrument(info_span!("connection", %addr)),
                        );
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
        }

        info!("🧹 Performing server cleanup...");
        let closed = self.connection_manager.close_all("Server shutting down");
        info!("Server stopped, {} connection(s) asked to close", closed);
        Ok(())
    }

    /// Stops the accept loop started by [`SyncServer::start`] or [`SyncServer::serve`].
    pub fn shutdown(&self) {
        self.shutdown_state.initiate_shutdown();
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn get_hub(&self) -> Arc<SyncHub> {
        self.hub.clone()
    }

    pub fn get_connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }
}
