//! Channel credentials and access validation.
//!
//! A [`CredentialSet`] is a read-only snapshot of every channel's listener
//! tokens, sender tokens, and sender IP allowlists. Snapshots are built by
//! the credential store on load and swapped wholesale on reload; validation
//! never mutates the set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Allowlist entry that accepts any source IP.
pub const IP_WILDCARD: &str = "0.0.0.0";

/// Credential authorizing a connection to receive events on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerCredential {
    /// Channel name (case-sensitive).
    pub channel: String,
    /// Opaque shared secret. Unique within the channel's listeners, not
    /// globally.
    pub token: String,
}

/// Credential authorizing a caller to publish events into a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderCredential {
    /// Channel name (case-sensitive).
    pub channel: String,
    /// Opaque shared secret.
    pub token: String,
    /// Source IPs allowed to use this credential. [`IP_WILDCARD`] accepts
    /// any IP. An empty allowlist rejects every caller.
    #[serde(default)]
    pub ip_allowlist: Vec<String>,
}

impl SenderCredential {
    /// Returns `true` if `source_ip` is accepted by this credential's
    /// allowlist, either via the wildcard or an exact match.
    #[must_use]
    pub fn allows_ip(&self, source_ip: &str) -> bool {
        self.ip_allowlist
            .iter()
            .any(|ip| ip == IP_WILDCARD || ip == source_ip)
    }
}

/// Immutable snapshot of all channel credentials for one run.
///
/// Channel identity is case-sensitive and fixed once the snapshot is built.
/// Lookup is a linear scan, matching the small per-deployment credential
/// counts this gateway is configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSet {
    listeners: Vec<ListenerCredential>,
    senders: Vec<SenderCredential>,
}

impl CredentialSet {
    /// Builds a snapshot from loaded credential records.
    #[must_use]
    pub fn new(listeners: Vec<ListenerCredential>, senders: Vec<SenderCredential>) -> Self {
        Self { listeners, senders }
    }

    /// Validates a listener `(channel, token)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidListener`] when no listener credential
    /// matches. An unknown channel is indistinguishable from a wrong token.
    pub fn validate_listener(&self, channel: &str, token: &str) -> Result<(), RelayError> {
        let valid = self
            .listeners
            .iter()
            .any(|l| l.channel == channel && l.token == token);
        if valid {
            Ok(())
        } else {
            Err(RelayError::InvalidListener)
        }
    }

    /// Validates a sender `(channel, token)` pair against `source_ip`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownSenderCredential`] when no sender
    /// credential matches the channel and token, or
    /// [`RelayError::IpNotAuthorized`] when the credential exists but its
    /// allowlist rejects `source_ip`. The two failures are deliberately
    /// distinct so the caller can count IP rejections.
    pub fn validate_sender(
        &self,
        channel: &str,
        token: &str,
        source_ip: &str,
    ) -> Result<(), RelayError> {
        let Some(sender) = self
            .senders
            .iter()
            .find(|s| s.channel == channel && s.token == token)
        else {
            return Err(RelayError::UnknownSenderCredential);
        };

        if sender.allows_ip(source_ip) {
            Ok(())
        } else {
            Err(RelayError::IpNotAuthorized {
                ip: source_ip.to_string(),
            })
        }
    }

    /// Returns every channel name declared in the snapshot, listeners and
    /// senders combined, sorted and deduplicated.
    #[must_use]
    pub fn channel_names(&self) -> BTreeSet<String> {
        self.listeners
            .iter()
            .map(|l| l.channel.clone())
            .chain(self.senders.iter().map(|s| s.channel.clone()))
            .collect()
    }

    /// Returns the number of listener credentials in the snapshot.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns the number of sender credentials in the snapshot.
    #[must_use]
    pub fn sender_count(&self) -> usize {
        self.senders.len()
    }
}
