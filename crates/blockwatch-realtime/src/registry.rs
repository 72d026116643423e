//! Connection registry: user identity → live connections.
//!
//! The registry is the only concurrently-mutated in-memory structure in the
//! pipeline. All mutation goes through `register`/`unregister`; callers never
//! see the underlying map, and reads hand out snapshots so iteration cannot
//! interleave with concurrent connection lifecycles.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info};

use blockwatch_core::UserId;

use crate::connection::{ConnectionHandle, ConnectionId};

/// Registry of live connections keyed by user identity.
///
/// A user with zero connections has no entry: the last `unregister` removes
/// the entry entirely, never leaving an empty set behind.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Vec<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to its user's set, creating the set if absent.
    ///
    /// No limit is enforced on concurrent connections per user.
    pub async fn register(&self, connection: ConnectionHandle) {
        let user_id = connection.user_id();
        let mut connections = self.connections.write().await;
        let entry = connections.entry(user_id).or_default();
        entry.push(connection);

        info!(
            user = %user_id,
            connections = entry.len(),
            "Connection registered"
        );
        metrics::gauge!("blockwatch_connections_active").increment(1.0);
    }

    /// Remove a connection from whichever user's set contains it.
    ///
    /// Idempotent: unregistering an unknown or already-removed connection is
    /// a no-op.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;

        let mut owner = None;
        for (user_id, handles) in connections.iter_mut() {
            let before = handles.len();
            handles.retain(|h| h.id() != connection_id);
            if handles.len() != before {
                owner = Some((*user_id, handles.len()));
                break;
            }
        }

        let Some((user_id, remaining)) = owner else {
            debug!(connection = %connection_id, "Unregister for unknown connection ignored");
            return;
        };

        if remaining == 0 {
            connections.remove(&user_id);
        }

        info!(
            user = %user_id,
            remaining,
            "Connection unregistered"
        );
        metrics::gauge!("blockwatch_connections_active").decrement(1.0);
    }

    /// Snapshot of the user's live connections; empty for unknown users.
    pub async fn connections_for(&self, user_id: UserId) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().await;
        connections.get(&user_id).cloned().unwrap_or_default()
    }

    /// Snapshot of every live connection, across all users.
    pub async fn all_connections(&self) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().await;
        connections.values().flatten().cloned().collect()
    }

    /// Users with at least one live connection.
    pub async fn connected_users(&self) -> Vec<UserId> {
        let connections = self.connections.read().await;
        connections.keys().copied().collect()
    }

    /// Total live connections across all users.
    pub async fn total_connections(&self) -> usize {
        let connections = self.connections.read().await;
        connections.values().map(|handles| handles.len()).sum()
    }
}
