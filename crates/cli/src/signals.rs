//! Process shutdown signals.
//!
//! SIGTERM and SIGINT both ask the agent to stop after the cycle in progress.
//! Handlers are installed by [`ShutdownSignals::register`], so a signal that
//! arrives while a cycle is mid-order never takes the default action.

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

pub struct ShutdownSignals {
    #[cfg(unix)]
    terminate: Signal,
    #[cfg(unix)]
    interrupt: Signal,
}

impl ShutdownSignals {
    /// Installs the handlers. Must be called inside the runtime.
    ///
    /// # Errors
    /// Returns error if a signal handler cannot be installed.
    #[cfg(unix)]
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the first shutdown signal and returns its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for Ctrl+C, stopping");
                "listener failure"
            }
        }
    }
}

/// Sets `stop` to true on the first shutdown signal.
pub fn forward_shutdown(mut signals: ShutdownSignals, stop: watch::Sender<bool>) -> JoinHandle<&'static str> {
    tokio::spawn(async move {
        let name = signals.recv().await;
        tracing::info!(signal = name, "Shutdown requested, stopping after the current cycle...");
        let _ = stop.send(true);
        name
    })
}
