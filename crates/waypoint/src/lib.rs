//! # Waypoint - Main Entry Point
//!
//! CLI parsing, configuration loading, logging setup and application
//! lifecycle for the position synchronization server.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (config.toml, created if missing)
//! waypoint
//!
//! # Override specific settings
//! waypoint --bind 0.0.0.0:3000 --log-level debug
//!
//! # Hosting platforms that assign a port
//! PORT=8080 waypoint
//!
//! # JSON logging for production
//! waypoint --json-logs
//! ```
//!
//! ## Signal Handling
//!
//! SIGINT and SIGTERM start a graceful shutdown: the accept loop stops, every
//! open connection is sent a close frame, and each client's departure is
//! broadcast as usual. A second signal exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

pub use config::{LoggingSettings, ServerSettings, WorldSettings};

/// Runs the server binary.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    let mut logging = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
