//! Relay service: validates access, tracks membership, dispatches events,
//! and records the audit trail.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{ChannelRegistry, ConnectionId, EventBus, RelayEvent};
use crate::error::RelayError;
use crate::store::event_log::SYSTEM_CHANNEL;
use crate::store::{CredentialCache, CredentialSource, FileEventLog, LogEntry};

/// Live/connection status of one configured channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    /// Whether the channel currently has at least one live member.
    pub is_active: bool,
    /// Number of live members.
    pub connections: usize,
}

/// Orchestration layer for all relay operations.
///
/// Every inbound operation follows the pattern: validate against the
/// credential snapshot → update registry or dispatch through the bus →
/// append an audit entry. Audit failures are swallowed: a failed log write
/// never fails the operation it records.
#[derive(Debug)]
pub struct RelayService {
    credentials: CredentialCache,
    registry: Arc<ChannelRegistry>,
    event_bus: EventBus,
    event_log: FileEventLog,
    /// Rejected publish attempts keyed by `(channel, ip)`. Counted and
    /// logged only; nothing in this gateway blocks a counted caller.
    rejections: RwLock<HashMap<(String, String), u64>>,
}

impl RelayService {
    /// Creates a new `RelayService`.
    #[must_use]
    pub fn new(
        credentials: CredentialCache,
        registry: Arc<ChannelRegistry>,
        event_bus: EventBus,
        event_log: FileEventLog,
    ) -> Self {
        Self {
            credentials,
            registry,
            event_bus,
            event_log,
            rejections: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`ChannelRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Joins a connection to a channel after listener validation.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidListener`] when no listener credential
    /// matches; the rejection is also written to the system audit channel.
    pub async fn subscribe(
        &self,
        channel: &str,
        token: &str,
        conn: ConnectionId,
    ) -> Result<(), RelayError> {
        let snapshot = self.credentials.snapshot().await;
        if let Err(err) = snapshot.validate_listener(channel, token) {
            self.audit_rejection(&err, channel, None).await;
            return Err(err);
        }

        self.registry.join(channel, conn).await;
        tracing::debug!(%conn, channel, "connection joined channel");

        self.record(LogEntry::new(
            channel,
            "join",
            serde_json::json!({ "connection_id": conn }),
        ))
        .await;
        Ok(())
    }

    /// Publishes an event into a channel after sender validation.
    ///
    /// Dispatches to every connection joined at this moment (best-effort,
    /// no snapshot isolation) and always appends a publish audit entry,
    /// even with zero recipients. Returns the channel's member count at
    /// dispatch time.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownSenderCredential`] when no sender
    /// credential matches, or [`RelayError::IpNotAuthorized`] when the
    /// credential's allowlist rejects `source_ip` — the latter also
    /// increments the per-`(channel, ip)` rejection counter.
    pub async fn publish(
        &self,
        channel: &str,
        token: &str,
        event: &str,
        payload: serde_json::Value,
        source_ip: &str,
    ) -> Result<usize, RelayError> {
        let snapshot = self.credentials.snapshot().await;
        if let Err(err) = snapshot.validate_sender(channel, token, source_ip) {
            if matches!(err, RelayError::IpNotAuthorized { .. }) {
                self.count_rejection(channel, source_ip).await;
            }
            self.audit_rejection(&err, channel, Some(source_ip)).await;
            return Err(err);
        }

        let recipients = self.registry.member_count(channel).await;
        self.event_bus
            .publish(RelayEvent::new(channel, event, payload.clone()));
        tracing::info!(channel, event, recipients, "event published");

        self.record(LogEntry::new(channel, event, payload)).await;
        Ok(recipients)
    }

    /// Removes a connection from every channel it had joined.
    ///
    /// Always succeeds. The caller (the session task) supplies its own join
    /// history; the registry does not track it.
    pub async fn disconnect(&self, conn: ConnectionId, channels: &[String]) {
        for channel in channels {
            self.registry.leave(channel, conn).await;
        }
        tracing::debug!(%conn, left = channels.len(), "connection disconnected");

        self.record(LogEntry::new(
            SYSTEM_CHANNEL,
            "disconnect",
            serde_json::json!({ "connection_id": conn }),
        ))
        .await;
    }

    /// Returns the status of every channel declared in the credential
    /// snapshot, including configured channels with no live members.
    pub async fn active_channels(&self) -> BTreeMap<String, ChannelStatus> {
        let snapshot = self.credentials.snapshot().await;
        let mut statuses = BTreeMap::new();
        for name in snapshot.channel_names() {
            let connections = self.registry.member_count(&name).await;
            statuses.insert(
                name,
                ChannelStatus {
                    is_active: connections > 0,
                    connections,
                },
            );
        }
        statuses
    }

    /// Returns the persisted audit entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::LogStoreUnavailable`] when the log file exists
    /// but cannot be read.
    pub async fn logs(&self) -> Result<Vec<LogEntry>, RelayError> {
        self.event_log.read().await
    }

    /// Reloads credentials from the named source.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidSource`] for an unknown selector, or
    /// [`RelayError::CredentialStoreUnavailable`] when the source cannot be
    /// read — in which case the previous snapshot stays in effect.
    pub async fn reload_credentials(&self, selector: &str) -> Result<(), RelayError> {
        let source = CredentialSource::parse(selector)?;
        self.credentials.reload(source).await
    }

    /// Returns the rejected-publish count for a `(channel, ip)` pair.
    pub async fn rejection_count(&self, channel: &str, ip: &str) -> u64 {
        let map = self.rejections.read().await;
        map.get(&(channel.to_string(), ip.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Appends the startup marker entry to the audit log.
    pub async fn record_server_reboot(&self) {
        self.record(LogEntry::new(
            SYSTEM_CHANNEL,
            "server_reboot",
            serde_json::json!("server rebooted"),
        ))
        .await;
    }

    async fn count_rejection(&self, channel: &str, ip: &str) {
        let mut map = self.rejections.write().await;
        let count = map
            .entry((channel.to_string(), ip.to_string()))
            .or_insert(0);
        *count += 1;
        tracing::warn!(channel, ip, count = *count, "publish rejected by ip allowlist");
    }

    /// Writes a validation failure to the system audit channel.
    async fn audit_rejection(&self, err: &RelayError, channel: &str, ip: Option<&str>) {
        self.record(LogEntry::new(
            SYSTEM_CHANNEL,
            "rejected",
            serde_json::json!({
                "kind": err.kind(),
                "channel": channel,
                "ip": ip,
            }),
        ))
        .await;
    }

    /// Best-effort audit write: failures go to the operational log only.
    async fn record(&self, entry: LogEntry) {
        if let Err(err) = self.event_log.append(entry).await {
            tracing::warn!(error = %err, "audit log append failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::FileCredentialStore;

    const LISTENERS: &str = r#"[
        {"channel": "bingo", "token": "oidor_2"},
        {"channel": "rifas", "token": "rifa_recibir"}
    ]"#;
    const SENDERS: &str = r#"[
        {"channel": "bingo", "token": "token_enviador_123", "ip_allowlist": ["0.0.0.0"]},
        {"channel": "rifas", "token": "Enviador_RV_001", "ip_allowlist": ["127.0.0.1"]},
        {"channel": "ais_shipping", "token": "envidor", "ip_allowlist": ["0.0.0.0"]}
    ]"#;

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir creation failed");
        })
    }

    async fn make_service(dir: &tempfile::TempDir) -> RelayService {
        let listeners_path = dir.path().join("listeners.json");
        let senders_path = dir.path().join("senders.json");
        std::fs::write(&listeners_path, LISTENERS).ok();
        std::fs::write(&senders_path, SENDERS).ok();

        let store = FileCredentialStore::new(listeners_path, senders_path);
        let cache = CredentialCache::initialize(store, None, CredentialSource::File)
            .await
            .ok()
            .unwrap_or_else(|| {
                panic!("cache initialization failed");
            });

        RelayService::new(
            cache,
            Arc::new(ChannelRegistry::new()),
            EventBus::new(1000),
            FileEventLog::new(dir.path().join("server_logs.json")),
        )
    }

    #[tokio::test]
    async fn subscribe_joins_and_logs() {
        let dir = tempdir();
        let service = make_service(&dir).await;
        let conn = ConnectionId::new();

        let result = service.subscribe("bingo", "oidor_2", conn).await;
        assert!(result.is_ok());
        assert_eq!(service.registry().member_count("bingo").await, 1);

        let logs = service.logs().await;
        let Ok(logs) = logs else {
            panic!("log read failed");
        };
        assert!(logs.iter().any(|e| e.channel == "bingo" && e.event == "join"));
    }

    #[tokio::test]
    async fn subscribe_with_wrong_token_fails_and_audits() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let result = service
            .subscribe("bingo", "wrong", ConnectionId::new())
            .await;
        assert!(matches!(result, Err(RelayError::InvalidListener)));
        assert_eq!(service.registry().member_count("bingo").await, 0);

        let logs = service.logs().await;
        let Ok(logs) = logs else {
            panic!("log read failed");
        };
        assert!(
            logs.iter()
                .any(|e| e.channel == SYSTEM_CHANNEL && e.event == "rejected")
        );
    }

    #[tokio::test]
    async fn publish_reaches_joined_connections() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        service.subscribe("rifas", "rifa_recibir", a).await.ok();
        service.subscribe("rifas", "rifa_recibir", b).await.ok();

        let mut rx = service.event_bus().subscribe();
        let delivered = service
            .publish(
                "rifas",
                "Enviador_RV_001",
                "new_order",
                serde_json::json!({ "order": 42 }),
                "127.0.0.1",
            )
            .await;
        let Ok(delivered) = delivered else {
            panic!("publish failed");
        };
        assert_eq!(delivered, 2);

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected broadcast event");
        };
        assert_eq!(event.channel(), "rifas");
        assert_eq!(event.event, "new_order");
    }

    #[tokio::test]
    async fn publish_after_disconnect_reaches_remaining_member() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        service.subscribe("rifas", "rifa_recibir", a).await.ok();
        service.subscribe("rifas", "rifa_recibir", b).await.ok();

        service.disconnect(a, &["rifas".to_string()]).await;
        assert_eq!(service.registry().member_count("rifas").await, 1);

        let delivered = service
            .publish(
                "rifas",
                "Enviador_RV_001",
                "new_order",
                serde_json::Value::Null,
                "127.0.0.1",
            )
            .await;
        assert_eq!(delivered.ok(), Some(1));
    }

    #[tokio::test]
    async fn publish_with_zero_recipients_still_logs() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let delivered = service
            .publish(
                "bingo",
                "token_enviador_123",
                "primero",
                serde_json::json!({ "ball": 7 }),
                "203.0.113.5",
            )
            .await;
        assert_eq!(delivered.ok(), Some(0));

        let logs = service.logs().await;
        let Ok(logs) = logs else {
            panic!("log read failed");
        };
        assert!(
            logs.iter()
                .any(|e| e.channel == "bingo" && e.event == "primero")
        );
    }

    #[tokio::test]
    async fn publish_with_unknown_credential_fails() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let result = service
            .publish(
                "rifas",
                "token_enviador_123",
                "new_order",
                serde_json::Value::Null,
                "127.0.0.1",
            )
            .await;
        assert!(matches!(result, Err(RelayError::UnknownSenderCredential)));
        // Unknown credential is not an IP rejection, so no count.
        assert_eq!(service.rejection_count("rifas", "127.0.0.1").await, 0);
    }

    #[tokio::test]
    async fn ip_rejection_increments_counter() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        for _ in 0..3 {
            let result = service
                .publish(
                    "rifas",
                    "Enviador_RV_001",
                    "new_order",
                    serde_json::Value::Null,
                    "203.0.113.5",
                )
                .await;
            assert!(matches!(result, Err(RelayError::IpNotAuthorized { .. })));
        }
        assert_eq!(service.rejection_count("rifas", "203.0.113.5").await, 3);
        // Counted and logged only — the next attempt from an allowed IP
        // still goes through.
        let result = service
            .publish(
                "rifas",
                "Enviador_RV_001",
                "new_order",
                serde_json::Value::Null,
                "127.0.0.1",
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn disconnect_leaves_all_joined_channels() {
        let dir = tempdir();
        let service = make_service(&dir).await;
        let conn = ConnectionId::new();

        service.subscribe("bingo", "oidor_2", conn).await.ok();
        service.subscribe("rifas", "rifa_recibir", conn).await.ok();

        service
            .disconnect(conn, &["bingo".to_string(), "rifas".to_string()])
            .await;
        assert_eq!(service.registry().member_count("bingo").await, 0);
        assert_eq!(service.registry().member_count("rifas").await, 0);
    }

    #[tokio::test]
    async fn active_channels_reports_configured_but_empty() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        service
            .subscribe("bingo", "oidor_2", ConnectionId::new())
            .await
            .ok();

        let statuses = service.active_channels().await;
        // ais_shipping has a sender credential only and no live members,
        // but still appears.
        let Some(ais) = statuses.get("ais_shipping") else {
            panic!("configured channel missing from report");
        };
        assert!(!ais.is_active);
        assert_eq!(ais.connections, 0);

        let Some(bingo) = statuses.get("bingo") else {
            panic!("bingo missing from report");
        };
        assert!(bingo.is_active);
        assert_eq!(bingo.connections, 1);
    }

    #[tokio::test]
    async fn reload_with_bad_selector_is_invalid_source() {
        let dir = tempdir();
        let service = make_service(&dir).await;

        let result = service.reload_credentials("json_remote").await;
        assert!(matches!(result, Err(RelayError::InvalidSource(_))));
    }
}
