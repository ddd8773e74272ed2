//! Logging system setup and configuration.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives appended to every filter; the WebSocket stack is chatty below warn.
const QUIET_DEPENDENCIES: &str = "tungstenite=warn,tokio_tungstenite=warn";

/// Initializes the tracing subscriber.
///
/// A non-empty `RUST_LOG` replaces the configured level. JSON output is used
/// when either the config or the `--json-logs` flag asks for it, and carries
/// the current span so connection logs keep their remote address.
pub fn setup_logging(
    config: &LoggingSettings,
    force_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());
    let filter = build_filter(&directives)?;

    let json = force_json || config.json_format;
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });
    let plain_layer = (!json).then(|| fmt::layer().with_target(true).with_thread_names(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()?;

    info!(json, "🔧 Logging initialized with filter: {}", directives);
    Ok(())
}

fn build_filter(directives: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(format!("{directives},{QUIET_DEPENDENCIES}"))
}

pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║            📍 WAYPOINT SERVER            ║");
    info!("║                 v{:<24}║", version);
    info!("║  Realtime position synchronization       ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_level_and_quiets_websocket_stack() {
        let filter = build_filter("debug").expect("level parses");
        let rendered = filter.to_string();

        assert!(rendered.contains("debug"));
        assert!(rendered.contains("tungstenite=warn"));
    }

    #[test]
    fn test_filter_accepts_per_target_directives() {
        assert!(build_filter("info,sync_server=trace").is_ok());
    }
}
