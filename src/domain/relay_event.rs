//! Events flowing through the relay.
//!
//! A [`RelayEvent`] is one published message: a named event with an
//! arbitrary JSON payload, scoped to a single channel. Events are broadcast
//! through the [`super::EventBus`] and forwarded only to connections joined
//! to the event's channel at dispatch time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published event bound for every live member of a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEvent {
    /// Channel the event was published into.
    pub channel: String,
    /// Event name chosen by the publisher (e.g. `"new_order"`).
    pub event: String,
    /// Arbitrary JSON payload.
    pub payload: serde_json::Value,
    /// Server-side publish timestamp.
    pub timestamp: DateTime<Utc>,
}

impl RelayEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(channel: &str, event: &str, payload: serde_json::Value) -> Self {
        Self {
            channel: channel.to_string(),
            event: event.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Returns the channel this event is scoped to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}
