//! Concurrent bookkeeping for live connections.
//!
//! [`ConnectionRegistry`] keeps one [`ConnectionInfo`] per open WebSocket
//! behind a [`tokio::sync::RwLock`], plus lifetime totals in atomics so
//! the health endpoint can read them without taking the lock. A
//! [`tokio::sync::Notify`] wakes shutdown when the last connection leaves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock};

use super::ConnectionId;

/// Metadata tracked for one open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// When the upgrade request was accepted.
    pub connected_at: DateTime<Utc>,
    /// Number of `run` events received on this connection.
    pub run_count: u64,
}

/// Registry of open connections.
///
/// # Concurrency
///
/// - Registration and removal take the write lock briefly.
/// - Lifetime totals are lock-free and monotonically increasing.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionInfo>>,
    total_connections: AtomicU64,
    total_runs: AtomicU64,
    idle: Notify,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new connection and returns its identifier.
    pub async fn register(&self) -> ConnectionId {
        let id = ConnectionId::new();
        let info = ConnectionInfo {
            connected_at: Utc::now(),
            run_count: 0,
        };
        self.connections.write().await.insert(id, info);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        id
    }

    /// Counts a `run` event for `id`.
    ///
    /// Runs on an unknown id still count towards the lifetime total.
    pub async fn record_run(&self, id: ConnectionId) {
        if let Some(info) = self.connections.write().await.get_mut(&id) {
            info.run_count = info.run_count.saturating_add(1);
        }
        self.total_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes a connection, returning what was tracked for it.
    ///
    /// Removing an id twice returns `None` the second time.
    pub async fn unregister(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        let mut map = self.connections.write().await;
        let removed = map.remove(&id);
        if map.is_empty() {
            self.idle.notify_waiters();
        }
        removed
    }

    /// Resolves once no connection is registered.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Enable before checking so an unregister in between is not missed.
            notified.as_mut().enable();
            if self.active_count().await == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Returns a copy of the metadata for `id`, if it is still open.
    pub async fn get(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Number of currently open connections.
    pub async fn active_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connections accepted since startup.
    #[must_use]
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// `run` events received since startup.
    #[must_use]
    pub fn total_runs(&self) -> u64 {
        self.total_runs.load(Ordering::Relaxed)
    }
}
