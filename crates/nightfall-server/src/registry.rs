//! Connection registry: connection → player mapping and liveness tracking.
//!
//! One entry per WebSocket connection: its bounded outbound queue, its room
//! membership, the last heartbeat time, and the handles needed to force the
//! connection closed. Lifecycle entry points (register, cleanup, reaper) are
//! the only mutators; everything sits behind one lock that is never held
//! across an await.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::sync::{Notify, mpsc};

/// How long a connection may stay silent before the reaper evicts it.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Reaper sweep interval.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(30);

/// A connection's room membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Room the connection's player is in
    pub room_id: String,
    /// Player id assigned at join
    pub player_id: String,
}

struct ConnectionEntry {
    outbound: mpsc::Sender<String>,
    close: Arc<Notify>,
    last_heartbeat: Instant,
    membership: Option<Membership>,
}

/// Process-wide connection registry.
#[derive(Default)]
pub struct Registry {
    connections: Mutex<HashMap<u64, ConnectionEntry>>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection.
    ///
    /// Returns `false` when the registry is at `max_connections`; the caller
    /// closes the socket.
    pub fn register(
        &self,
        conn_id: u64,
        outbound: mpsc::Sender<String>,
        close: Arc<Notify>,
        now: Instant,
        max_connections: usize,
    ) -> bool {
        let Ok(mut connections) = self.connections.lock() else { return false };
        if connections.len() >= max_connections {
            return false;
        }
        connections.insert(conn_id, ConnectionEntry {
            outbound,
            close,
            last_heartbeat: now,
            membership: None,
        });
        true
    }

    /// Remove a connection, returning its membership for room cleanup.
    ///
    /// Idempotent: a second call for the same id is a no-op returning `None`.
    pub fn unregister(&self, conn_id: u64) -> Option<Membership> {
        let mut connections = self.connections.lock().ok()?;
        connections.remove(&conn_id).and_then(|entry| entry.membership)
    }

    /// Record a heartbeat.
    pub fn heartbeat(&self, conn_id: u64, now: Instant) {
        if let Ok(mut connections) = self.connections.lock() {
            if let Some(entry) = connections.get_mut(&conn_id) {
                entry.last_heartbeat = now;
            }
        }
    }

    /// Attach a room membership after a successful join.
    pub fn set_membership(&self, conn_id: u64, membership: Membership) {
        if let Ok(mut connections) = self.connections.lock() {
            if let Some(entry) = connections.get_mut(&conn_id) {
                entry.membership = Some(membership);
            }
        }
    }

    /// Detach the room membership after a leave.
    pub fn clear_membership(&self, conn_id: u64) {
        if let Ok(mut connections) = self.connections.lock() {
            if let Some(entry) = connections.get_mut(&conn_id) {
                entry.membership = None;
            }
        }
    }

    /// Current membership of a connection.
    #[must_use]
    pub fn membership(&self, conn_id: u64) -> Option<Membership> {
        let connections = self.connections.lock().ok()?;
        connections.get(&conn_id).and_then(|entry| entry.membership.clone())
    }

    /// Outbound queue of a connection.
    #[must_use]
    pub fn outbound(&self, conn_id: u64) -> Option<mpsc::Sender<String>> {
        let connections = self.connections.lock().ok()?;
        connections.get(&conn_id).map(|entry| entry.outbound.clone())
    }

    /// Force a connection's read and write loops to stop.
    ///
    /// The gateway's normal disconnect path then runs the idempotent
    /// cleanup.
    pub fn kick(&self, conn_id: u64) {
        let close = {
            let Ok(connections) = self.connections.lock() else { return };
            connections.get(&conn_id).map(|entry| Arc::clone(&entry.close))
        };
        if let Some(close) = close {
            close.notify_waiters();
        }
    }

    /// Connections whose last heartbeat is older than the timeout.
    #[must_use]
    pub fn stale_connections(&self, now: Instant) -> Vec<u64> {
        let Ok(connections) = self.connections.lock() else { return Vec::new() };
        connections
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_heartbeat) > HEARTBEAT_TIMEOUT)
            .map(|(conn_id, _)| *conn_id)
            .collect()
    }

    /// Total registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().map(|connections| connections.len()).unwrap_or(0)
    }

    /// Connections currently inside a room.
    #[must_use]
    pub fn players_in_rooms(&self) -> usize {
        self.connections
            .lock()
            .map(|connections| {
                connections.values().filter(|entry| entry.membership.is_some()).count()
            })
            .unwrap_or(0)
    }
}
