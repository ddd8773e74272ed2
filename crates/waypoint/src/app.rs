//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that loads configuration,
//! runs the sync server, reports health, and drives graceful shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{spawn_signal_watcher, ShutdownSignals},
};
use std::sync::Arc;
use sync_server::{ShutdownState, SyncHub, SyncServer};
use tracing::{error, info, warn};

/// Main application struct.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Sync server instance
    server: SyncServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply `PORT` and command-line overrides
    /// 3. Validate merged configuration
    /// 4. Create the sync server
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // PORT first so an explicit --bind still wins.
        if let Ok(port) = std::env::var("PORT") {
            config.apply_port_override(&port)?;
        }

        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server = SyncServer::new(config.to_server_config()?);
        Ok(Self { config, server })
    }

    /// Runs the server until a shutdown signal arrives.
    ///
    /// A second signal during shutdown exits the process immediately.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let hub = self.server.get_hub();
        let connection_manager = self.server.get_connection_manager();
        let shutdown_state = ShutdownState::new();

        // Listen before serving so an early Ctrl+C still shuts down cleanly.
        let signals = ShutdownSignals::install()?;
        let signal_watcher = spawn_signal_watcher(signals, shutdown_state.clone());

        let server_handle = {
            let server = self.server;
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                if let Err(e) = server.start_with_shutdown_state(shutdown_state).await {
                    error!("❌ Server error: {}", e);
                    std::process::exit(1);
                }
            })
        };

        let monitoring_handle = match self.config.server.stats_interval_secs {
            0 => None,
            secs => Some(tokio::spawn(report_health(hub.clone(), secs))),
        };

        info!("✅ Waypoint is now running on {}", self.config.server.bind_address);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // The watcher stays alive during shutdown so a second signal exits.
        shutdown_state.wait_for_shutdown().await;

        if let Some(handle) = monitoring_handle {
            handle.abort();
        }

        if let Err(e) = tokio::time::timeout(tokio::time::Duration::from_secs(8), server_handle).await {
            warn!("⏰ Server task did not stop within timeout: {:?}", e);
        }

        // Connection tasks finish their leave protocol once clients answer the close frame.
        let mut wait_cycles = 0;
        const MAX_WAIT_CYCLES: u32 = 30;
        while connection_manager.connection_count() > 0 && wait_cycles < MAX_WAIT_CYCLES {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            wait_cycles += 1;
        }
        if connection_manager.connection_count() > 0 {
            info!(
                "⏰ Timeout reached with {} connection(s) still open",
                connection_manager.connection_count()
            );
        }
        signal_watcher.abort();

        info!("📊 Players connected at exit: {}", hub.player_count().await);
        info!("✅ Waypoint shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  📦 Max message size: {} bytes", self.config.server.max_message_size);
        info!(
            "  📍 Spawn point: ({}, {})",
            self.config.world.spawn_x, self.config.world.spawn_y
        );
    }
}

async fn report_health(hub: Arc<SyncHub>, interval_secs: u64) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
    // The first tick fires immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        info!("📊 System Health - {} player(s) connected", hub.player_count().await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_in(dir: &TempDir, bind_address: Option<&str>) -> CliArgs {
        CliArgs {
            config_path: dir.path().join("config.toml"),
            bind_address: bind_address.map(str::to_string),
            log_level: Some("debug".to_string()),
            json_logs: true,
        }
    }

    #[tokio::test]
    async fn test_application_applies_cli_overrides() {
        let dir = TempDir::new().expect("temp dir");
        let args = args_in(&dir, Some("127.0.0.1:0"));

        let app = Application::new(args.clone()).await.expect("application starts");

        assert!(args.config_path.exists());
        assert_eq!(app.config.server.bind_address, "127.0.0.1:0");
        assert_eq!(app.config.logging.level, "debug");
        assert!(app.config.logging.json_format);
        assert_eq!(app.server.config().bind_address.port(), 0);
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_override() {
        let dir = TempDir::new().expect("temp dir");
        let args = args_in(&dir, Some("nowhere"));

        assert!(Application::new(args).await.is_err());
    }
}
