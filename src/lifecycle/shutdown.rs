//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Broadcast-based shutdown signal shared by the gateway's long-running
/// tasks.
///
/// The HTTP server drains on the signal; `main` then unpublishes the
/// registrar's records, so the registry connection outlives every
/// subscriber.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Spawn a task translating Ctrl+C into the shutdown signal.
    pub fn listen_for_signals(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = tx.send(());
            } else {
                tracing::error!("Failed to install Ctrl+C handler");
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
