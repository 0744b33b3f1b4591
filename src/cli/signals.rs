//! Signal handling for the requester and the watcher

use colored::Colorize;
use tokio::sync::watch;

/// Shutdown signal broadcast over a watch channel.
///
/// Receivers see `true` once SIGINT or SIGTERM (Ctrl+C off unix) arrives.
pub struct ShutdownSignal {
    sender: watch::Sender<bool>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self { sender, receiver }
    }

    /// Get a receiver for the shutdown flag
    pub fn receiver(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }

    /// Setup OS signal handlers. `announce` echoes the signal to stderr.
    #[cfg(unix)]
    pub async fn setup(&self, announce: bool) -> Result<(), std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            if announce {
                eprintln!("{} Received {} (shutdown)", "↓".cyan(), name);
            }
            let _ = sender.send(true);
        });

        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn setup(&self, announce: bool) -> Result<(), std::io::Error> {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                if announce {
                    eprintln!("{} Received Ctrl+C (shutdown)", "↓".cyan());
                }
                let _ = sender.send(true);
            }
        });
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
