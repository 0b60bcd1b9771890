//! Channel membership tracking.
//!
//! [`ChannelRegistry`] maps each channel name to the set of live
//! [`ConnectionId`]s currently joined to it. Purely in-memory: the map is
//! rebuilt from zero on process restart, and there is no per-connection join
//! history here — the WebSocket session owns that and replays `leave` calls
//! on disconnect.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use super::ConnectionId;

/// Central store of channel → live member set.
///
/// Uses a `RwLock<HashMap<...>>`; every mutation completes before the lock
/// is released, so no task observes a partially updated membership map.
///
/// Invariants:
/// - a connection never appears twice in the same channel's member set;
/// - removing the last member removes the channel entry entirely, so
///   "channel present in the map" ⇔ "channel has ≥ 1 live member".
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, HashSet<ConnectionId>>>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a connection to a channel's member set.
    ///
    /// Idempotent: re-joining an already-member connection is a no-op.
    /// The member set is created lazily on first join. Returns `true` if
    /// the connection was newly added.
    pub async fn join(&self, channel: &str, conn: ConnectionId) -> bool {
        let mut map = self.channels.write().await;
        map.entry(channel.to_string()).or_default().insert(conn)
    }

    /// Removes a connection from a channel's member set.
    ///
    /// Removes the channel entry entirely when the set becomes empty.
    /// Returns `true` if the connection was a member.
    pub async fn leave(&self, channel: &str, conn: ConnectionId) -> bool {
        let mut map = self.channels.write().await;
        let Some(members) = map.get_mut(channel) else {
            return false;
        };
        let removed = members.remove(&conn);
        if members.is_empty() {
            map.remove(channel);
        }
        removed
    }

    /// Returns the number of live members of a channel, 0 when the channel
    /// has no entry.
    pub async fn member_count(&self, channel: &str) -> usize {
        let map = self.channels.read().await;
        map.get(channel).map_or(0, HashSet::len)
    }

    /// Returns the names of channels that currently have at least one live
    /// member.
    pub async fn active_channels(&self) -> Vec<String> {
        let map = self.channels.read().await;
        map.keys().cloned().collect()
    }

    /// Returns the total number of distinct channel entries with members.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Returns `true` if no channel has any live member.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}
