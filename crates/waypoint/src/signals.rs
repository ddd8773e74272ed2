//! Signal handling for graceful server shutdown.
//!
//! The first SIGINT/SIGTERM triggers the application's [`ShutdownState`]. Any
//! later signal means the operator is done waiting and the process exits.

use std::io;
use sync_server::ShutdownState;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What to do about a received termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Shutdown was just initiated
    Graceful,
    /// Shutdown was already in progress
    ForceExit,
}

/// Listeners for the signals that stop the server.
///
/// Installed once up front so a signal arriving while shutdown is already
/// running is not missed.
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                sigint: signal(SignalKind::interrupt())?,
                sigterm: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Waits for the next signal and returns its name.
    pub async fn recv(&mut self) -> io::Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.sigint.recv() => Ok("SIGINT"),
                _ = self.sigterm.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("Ctrl+C")
        }
    }
}

/// Applies one received signal to `shutdown`.
pub fn on_signal(shutdown: &ShutdownState) -> SignalAction {
    if shutdown.is_shutdown_initiated() {
        SignalAction::ForceExit
    } else {
        shutdown.initiate_shutdown();
        SignalAction::Graceful
    }
}

/// Spawns the task that turns signals into shutdown requests for `shutdown`.
pub fn spawn_signal_watcher(mut signals: ShutdownSignals, shutdown: ShutdownState) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let name = match signals.recv().await {
                Ok(name) => name,
                Err(e) => {
                    error!("Signal listener failed: {e}");
                    return;
                }
            };

            match on_signal(&shutdown) {
                SignalAction::Graceful => {
                    info!("📡 Received {} - initiating graceful shutdown", name);
                }
                SignalAction::ForceExit => {
                    warn!("Received {} again during shutdown, exiting immediately", name);
                    std::process::exit(1);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_signal_initiates_shared_state() {
        let shutdown = ShutdownState::new();
        let observer = shutdown.clone();

        assert_eq!(on_signal(&shutdown), SignalAction::Graceful);
        assert!(observer.is_shutdown_initiated());
    }

    #[test]
    fn test_repeated_signal_forces_exit() {
        let shutdown = ShutdownState::new();
        on_signal(&shutdown);

        assert_eq!(on_signal(&shutdown), SignalAction::ForceExit);
        assert_eq!(on_signal(&shutdown), SignalAction::ForceExit);
    }

    #[tokio::test]
    async fn test_install_listeners() {
        assert!(ShutdownSignals::install().is_ok());
    }
}
