//! PostgreSQL implementation of the credential source.
//!
//! Reads the `relay_channels`, `relay_tokens`, and `relay_allowed_ips`
//! tables into a [`CredentialSet`] snapshot. Tokens carry a `role` column
//! (`listener` or `sender`); allowed IPs are declared per channel and apply
//! to every sender credential on that channel.

use std::collections::HashMap;

use sqlx::PgPool;

use super::credential_store::CredentialStore;
use crate::domain::credentials::{CredentialSet, ListenerCredential, SenderCredential};
use crate::error::RelayError;

/// PostgreSQL-backed credential store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Creates a new credential store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_tokens(&self, role: &str) -> Result<Vec<(String, String)>, RelayError> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT c.name, t.token FROM relay_tokens t \
             JOIN relay_channels c ON t.channel_id = c.id \
             WHERE t.role = $1 ORDER BY c.name, t.token",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::CredentialStoreUnavailable(e.to_string()))
    }

    async fn load_allowed_ips(&self) -> Result<HashMap<String, Vec<String>>, RelayError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT c.name, i.ip FROM relay_allowed_ips i \
             JOIN relay_channels c ON i.channel_id = c.id ORDER BY c.name, i.ip",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::CredentialStoreUnavailable(e.to_string()))?;

        let mut by_channel: HashMap<String, Vec<String>> = HashMap::new();
        for (channel, ip) in rows {
            by_channel.entry(channel).or_default().push(ip);
        }
        Ok(by_channel)
    }
}

impl CredentialStore for PostgresCredentialStore {
    async fn load(&self) -> Result<CredentialSet, RelayError> {
        let listeners = self
            .load_tokens("listener")
            .await?
            .into_iter()
            .map(|(channel, token)| ListenerCredential { channel, token })
            .collect();

        let allowed_ips = self.load_allowed_ips().await?;
        let senders = self
            .load_tokens("sender")
            .await?
            .into_iter()
            .map(|(channel, token)| {
                let ip_allowlist = allowed_ips.get(&channel).cloned().unwrap_or_default();
                SenderCredential {
                    channel,
                    token,
                    ip_allowlist,
                }
            })
            .collect();

        Ok(CredentialSet::new(listeners, senders))
    }
}
