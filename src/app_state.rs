//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::ConnectionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Open connections and lifetime counters.
    pub registry: Arc<ConnectionRegistry>,
    /// Largest message accepted on the WebSocket, in bytes.
    pub max_message_bytes: usize,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Creates state with an empty registry.
    #[must_use]
    pub fn new(max_message_bytes: usize) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            max_message_bytes,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Returns a receiver that flips to `true` once shutdown starts.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Tells every open connection to disconnect.
    pub fn trigger_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
