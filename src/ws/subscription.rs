//! Per-connection joined-channel tracking.
//!
//! The registry holds channel → members; the session holds the inverse,
//! the channels this connection has joined, and replays `leave` for each of
//! them on disconnect. Also used for server-side event filtering.

use std::collections::HashSet;

/// The set of channels one WebSocket connection has joined.
#[derive(Debug, Default)]
pub struct JoinedChannels {
    channels: HashSet<String>,
}

impl JoinedChannels {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful join. Returns `false` if already joined.
    pub fn join(&mut self, channel: &str) -> bool {
        self.channels.insert(channel.to_string())
    }

    /// Removes a channel. Returns `true` if it was joined.
    pub fn leave(&mut self, channel: &str) -> bool {
        self.channels.remove(channel)
    }

    /// Returns `true` if events on `channel` should reach this connection.
    #[must_use]
    pub fn matches(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Returns the number of joined channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the joined channel names for disconnect replay.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().cloned().collect()
    }
}
