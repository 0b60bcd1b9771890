//! Bounded, self-pruning audit log of relay actions.
//!
//! Every publish, join, and disconnect appends a [`LogEntry`]. The log is
//! append-only from the caller's perspective: entries are never mutated and
//! there is no clear or delete operation, only time- and count-driven
//! eviction applied at append time.
//!
//! The backing file is rewritten with a load-mutate-persist cycle that is
//! not atomic across processes; concurrent writers lose updates
//! (last-writer-wins). The gateway is deployed single-process for this
//! reason.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Hard cap on retained entries. Applied after the time window, so an entry
/// can be evicted by count before it ages out.
pub const MAX_LOG_ENTRIES: usize = 200;

/// Retention window in hours. Entries older than this are discarded on the
/// next append.
pub const RETENTION_HOURS: i64 = 24;

/// Channel name used for entries the server writes about itself
/// (reboots, disconnects, rejected attempts).
pub const SYSTEM_CHANNEL: &str = "system";

/// One audit record: what happened, where, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Insertion timestamp; entries are ordered by this field.
    pub created_at: DateTime<Utc>,
    /// Channel the action targeted, or [`SYSTEM_CHANNEL`].
    pub channel: String,
    /// Event kind (publish event name, `"join"`, `"disconnect"`, ...).
    pub event: String,
    /// Action-specific JSON payload.
    pub payload: serde_json::Value,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(channel: &str, event: &str, payload: serde_json::Value) -> Self {
        Self {
            created_at: Utc::now(),
            channel: channel.to_string(),
            event: event.to_string(),
            payload,
        }
    }
}

/// JSON-file-backed event log.
///
/// `append` runs the full retention policy on every call: load current
/// entries, add the new one, drop everything older than
/// [`RETENTION_HOURS`], keep at most the most recent [`MAX_LOG_ENTRIES`],
/// persist the result.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    /// Creates a log backed by the given file path. The file is created on
    /// first append.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Appends an entry and enforces the retention policy.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::LogStoreUnavailable`] when the backing file
    /// cannot be read or written. Callers recording best-effort audit
    /// entries swallow this error.
    pub async fn append(&self, entry: LogEntry) -> Result<(), RelayError> {
        let mut entries = self.read().await?;
        entries.push(entry);

        let cutoff = Utc::now() - Duration::hours(RETENTION_HOURS);
        entries.retain(|e| e.created_at > cutoff);

        let excess = entries.len().saturating_sub(MAX_LOG_ENTRIES);
        if excess > 0 {
            entries.drain(..excess);
        }

        self.persist(&entries).await
    }

    /// Returns all persisted entries, oldest first. Returns an empty vec
    /// when no log file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::LogStoreUnavailable`] when the file exists but
    /// cannot be read or parsed.
    pub async fn read(&self) -> Result<Vec<LogEntry>, RelayError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                RelayError::LogStoreUnavailable(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RelayError::LogStoreUnavailable(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn persist(&self, entries: &[LogEntry]) -> Result<(), RelayError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| RelayError::LogStoreUnavailable(e.to_string()))?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            RelayError::LogStoreUnavailable(format!("{}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_log(dir: &tempfile::TempDir) -> FileEventLog {
        FileEventLog::new(dir.path().join("server_logs.json"))
    }

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir creation failed");
        })
    }

    #[tokio::test]
    async fn read_without_file_returns_empty() {
        let dir = tempdir();
        let log = make_log(&dir);
        let entries = log.read().await;
        let Ok(entries) = entries else {
            panic!("read failed");
        };
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn round_trip_preserves_insertion_order() {
        let dir = tempdir();
        let log = make_log(&dir);

        for i in 0..5 {
            let entry = LogEntry::new("rifas", "new_order", serde_json::json!({ "n": i }));
            let result = log.append(entry).await;
            assert!(result.is_ok());
        }

        let entries = log.read().await;
        let Ok(entries) = entries else {
            panic!("read failed");
        };
        assert_eq!(entries.len(), 5);
        let ns: Vec<i64> = entries
            .iter()
            .filter_map(|e| e.payload.get("n").and_then(serde_json::Value::as_i64))
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn count_cap_evicts_oldest_entry() {
        let dir = tempdir();
        let log = make_log(&dir);

        // Seed MAX_LOG_ENTRIES entries directly; appending one-by-one through
        // the policy would be slow and equivalent.
        let now = Utc::now();
        let seed: Vec<LogEntry> = (0..MAX_LOG_ENTRIES)
            .map(|i| LogEntry {
                created_at: now - Duration::seconds(i64::try_from(MAX_LOG_ENTRIES - i).unwrap_or(0)),
                channel: "bingo".to_string(),
                event: "seed".to_string(),
                payload: serde_json::json!({ "n": i }),
            })
            .collect();
        log.persist(&seed).await.ok();

        let result = log
            .append(LogEntry::new("bingo", "latest", serde_json::Value::Null))
            .await;
        assert!(result.is_ok());

        let entries = log.read().await;
        let Ok(entries) = entries else {
            panic!("read failed");
        };
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        // The oldest seeded entry (n = 0) must be gone, the newest appended
        // entry must be last.
        let first_n = entries
            .first()
            .and_then(|e| e.payload.get("n"))
            .and_then(serde_json::Value::as_i64);
        assert_eq!(first_n, Some(1));
        let last_event = entries.last().map(|e| e.event.clone());
        assert_eq!(last_event.as_deref(), Some("latest"));
    }

    #[tokio::test]
    async fn stale_entry_evicted_on_next_append() {
        let dir = tempdir();
        let log = make_log(&dir);

        let stale = LogEntry {
            created_at: Utc::now() - Duration::hours(25),
            channel: "bingo".to_string(),
            event: "old".to_string(),
            payload: serde_json::Value::Null,
        };
        log.persist(&[stale]).await.ok();

        let result = log
            .append(LogEntry::new("bingo", "fresh", serde_json::Value::Null))
            .await;
        assert!(result.is_ok());

        let entries = log.read().await;
        let Ok(entries) = entries else {
            panic!("read failed");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|e| e.event.as_str()), Some("fresh"));
    }

    #[tokio::test]
    async fn corrupt_file_reports_log_store_unavailable() {
        let dir = tempdir();
        let log = make_log(&dir);
        std::fs::write(dir.path().join("server_logs.json"), "not json").ok();

        let result = log.read().await;
        assert!(matches!(result, Err(RelayError::LogStoreUnavailable(_))));
    }
}
