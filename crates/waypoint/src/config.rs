//! Configuration management for the Waypoint server.
//!
//! This module handles loading, validation, and conversion of server
//! configuration from TOML files, command-line arguments and the `PORT`
//! environment variable.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use sync_server::{ServerConfig, SpawnPoint};
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    pub server: ServerSettings,
    /// World configuration settings
    #[serde(default)]
    pub world: WorldSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Network binding and connection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:3000")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Largest inbound WebSocket message accepted, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Seconds between health log lines (0 to disable)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_max_message_size() -> usize {
    64 * 1024
}

fn default_stats_interval_secs() -> u64 {
    60
}

fn default_spawn_coordinate() -> f64 {
    100.0
}

/// Where new players appear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    #[serde(default = "default_spawn_coordinate")]
    pub spawn_x: f64,
    #[serde(default = "default_spawn_coordinate")]
    pub spawn_y: f64,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            max_connections: default_max_connections(),
            max_message_size: default_max_message_size(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            spawn_x: default_spawn_coordinate(),
            spawn_y: default_spawn_coordinate(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first if none
    /// exists.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Replaces the port of the bind address, keeping the host.
    pub fn apply_port_override(&mut self, port: &str) -> Result<(), String> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| format!("Invalid port: {port}"))?;
        let mut addr: SocketAddr = self
            .server
            .bind_address
            .parse()
            .map_err(|_| format!("Invalid bind address: {}", self.server.bind_address))?;
        addr.set_port(port);
        self.server.bind_address = addr.to_string();
        Ok(())
    }

    /// Converts the application configuration into the server's own config.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            max_message_size: self.server.max_message_size,
            spawn: SpawnPoint {
                x: self.world.spawn_x,
                y: self.world.spawn_y,
            },
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.max_connections == 0 {
            return Err("server.max_connections must be greater than 0".to_string());
        }

        if self.server.max_message_size == 0 {
            return Err("server.max_message_size must be greater than 0".to_string());
        }

        if !self.world.spawn_x.is_finite() || !self.world.spawn_y.is_finite() {
            return Err("world spawn coordinates must be finite".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.server.max_message_size, 64 * 1024);
        assert_eq!(config.server.stats_interval_secs, 60);
        assert_eq!(config.world.spawn_x, 100.0);
        assert_eq!(config.world.spawn_y, 100.0);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.expect("default config loads");

        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.expect("written config loads");
        assert_eq!(reloaded.server.bind_address, config.server.bind_address);
    }

    #[tokio::test]
    async fn test_load_existing_file_with_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        let toml_content = r#"
[server]
bind_address = "0.0.0.0:4000"
max_connections = 50

[world]
spawn_x = 32.0

[logging]
level = "debug"
"#;
        tokio::fs::write(&path, toml_content).await.expect("write config");

        let config = AppConfig::load_from_file(&path).await.expect("config parses");

        assert_eq!(config.server.bind_address, "0.0.0.0:4000");
        assert_eq!(config.server.max_connections, 50);
        assert_eq!(config.server.max_message_size, 64 * 1024);
        assert_eq!(config.world.spawn_x, 32.0);
        assert_eq!(config.world.spawn_y, 100.0);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_invalid_toml_fails() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[server\nbind_address = 1").await.expect("write config");

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }

    #[test]
    fn test_to_server_config_conversion() {
        let mut config = AppConfig::default();
        config.server.max_connections = 8;
        config.world.spawn_x = 1.5;
        config.world.spawn_y = -2.0;

        let server_config = config.to_server_config().expect("valid config converts");

        assert_eq!(server_config.bind_address.to_string(), "127.0.0.1:3000");
        assert_eq!(server_config.max_connections, 8);
        assert_eq!(server_config.spawn, SpawnPoint { x: 1.5, y: -2.0 });
    }

    #[test]
    fn test_port_override_keeps_host() {
        let mut config = AppConfig::default();
        config.server.bind_address = "0.0.0.0:3000".to_string();

        config.apply_port_override("8081").expect("valid port");
        assert_eq!(config.server.bind_address, "0.0.0.0:8081");

        assert!(config.apply_port_override("http").is_err());
        assert!(config.apply_port_override("70000").is_err());
        assert_eq!(config.server.bind_address, "0.0.0.0:8081");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.world.spawn_y = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = AppConfig::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{level} should be accepted");
        }
    }
}
