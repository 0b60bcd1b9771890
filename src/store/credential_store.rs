//! Pluggable credential sources and the reloadable snapshot cache.
//!
//! A [`CredentialStore`] produces a complete [`CredentialSet`] snapshot in
//! one read. [`CredentialCache`] holds the currently active snapshot and
//! swaps it atomically on reload — a failed load leaves the previous
//! snapshot in effect, never a partial overwrite.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::credentials::{CredentialSet, ListenerCredential, SenderCredential};
use crate::error::RelayError;
use crate::store::postgres::PostgresCredentialStore;

/// Read-only source of credential snapshots.
///
/// Implementations read their backing resource in full on every `load` so
/// the cache can swap snapshots all-or-nothing.
pub trait CredentialStore {
    /// Loads a complete credential snapshot from the backing source.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::CredentialStoreUnavailable`] when the source
    /// cannot be read or parsed.
    fn load(&self) -> impl std::future::Future<Output = Result<CredentialSet, RelayError>> + Send;
}

/// Selector naming which backing source a (re)load should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// JSON files on local disk (`listeners.json` + `senders.json`).
    File,
    /// PostgreSQL tables via [`PostgresCredentialStore`].
    Database,
}

impl CredentialSource {
    /// Parses a source selector string.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidSource`] for any selector other than
    /// `"file"` or `"database"`.
    pub fn parse(s: &str) -> Result<Self, RelayError> {
        match s {
            "file" => Ok(Self::File),
            "database" => Ok(Self::Database),
            other => Err(RelayError::InvalidSource(other.to_string())),
        }
    }

    /// Returns the selector string for this source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Database => "database",
        }
    }
}

/// File-backed credential store reading two JSON documents.
///
/// `listeners.json` holds an array of `{ "channel", "token" }` records and
/// `senders.json` an array of `{ "channel", "token", "ip_allowlist" }`
/// records.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    listeners_path: PathBuf,
    senders_path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store reading from the given listener and sender files.
    #[must_use]
    pub fn new(listeners_path: PathBuf, senders_path: PathBuf) -> Self {
        Self {
            listeners_path,
            senders_path,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, RelayError> {
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            RelayError::CredentialStoreUnavailable(format!("{}: {e}", path.display()))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            RelayError::CredentialStoreUnavailable(format!("{}: {e}", path.display()))
        })
    }
}

impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<CredentialSet, RelayError> {
        let listeners: Vec<ListenerCredential> = Self::read_json(&self.listeners_path).await?;
        let senders: Vec<SenderCredential> = Self::read_json(&self.senders_path).await?;
        Ok(CredentialSet::new(listeners, senders))
    }
}

/// The snapshot currently in effect, paired with the source it came from.
///
/// Held behind one lock so readers never observe a snapshot from one source
/// paired with the selector of another.
#[derive(Debug)]
struct ActiveCredentials {
    set: Arc<CredentialSet>,
    source: CredentialSource,
}

/// Reloadable holder of the active credential snapshot.
///
/// Construction requires an initial successful load (a credential-store
/// failure at startup is fatal to initialization). Reload is all-or-nothing:
/// validation keeps reading the old snapshot until a new one has loaded
/// completely.
#[derive(Debug)]
pub struct CredentialCache {
    file: FileCredentialStore,
    database: Option<PostgresCredentialStore>,
    active: RwLock<ActiveCredentials>,
}

impl CredentialCache {
    /// Builds the cache and performs the initial load from `source`.
    ///
    /// # Errors
    ///
    /// Returns the load error unchanged — startup must abort when the
    /// initial snapshot cannot be read.
    pub async fn initialize(
        file: FileCredentialStore,
        database: Option<PostgresCredentialStore>,
        source: CredentialSource,
    ) -> Result<Self, RelayError> {
        let cache = Self {
            file,
            database,
            active: RwLock::new(ActiveCredentials {
                set: Arc::new(CredentialSet::default()),
                source,
            }),
        };
        let initial = cache.load_from(source).await?;
        cache.active.write().await.set = Arc::new(initial);
        Ok(cache)
    }

    async fn load_from(&self, source: CredentialSource) -> Result<CredentialSet, RelayError> {
        match source {
            CredentialSource::File => self.file.load().await,
            CredentialSource::Database => match &self.database {
                Some(db) => db.load().await,
                None => Err(RelayError::CredentialStoreUnavailable(
                    "no database source configured".to_string(),
                )),
            },
        }
    }

    /// Returns the currently active snapshot.
    pub async fn snapshot(&self) -> Arc<CredentialSet> {
        Arc::clone(&self.active.read().await.set)
    }

    /// Returns the currently active source selector.
    pub async fn active_source(&self) -> CredentialSource {
        self.active.read().await.source
    }

    /// Reloads credentials from the given source.
    ///
    /// On success the snapshot and active source are swapped under one
    /// write lock, so no reader sees one without the other; on failure
    /// both keep their previous values.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::CredentialStoreUnavailable`] when the source
    /// cannot be read. The previous snapshot stays in effect.
    pub async fn reload(&self, source: CredentialSource) -> Result<(), RelayError> {
        let fresh = self.load_from(source).await?;
        let mut active = self.active.write().await;
        active.set = Arc::new(fresh);
        active.source = source;
        drop(active);
        tracing::info!(source = source.as_str(), "credentials reloaded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn write_files(dir: &tempfile::TempDir, listeners: &str, senders: &str) -> FileCredentialStore {
        let listeners_path = dir.path().join("listeners.json");
        let senders_path = dir.path().join("senders.json");
        std::fs::write(&listeners_path, listeners).ok();
        std::fs::write(&senders_path, senders).ok();
        FileCredentialStore::new(listeners_path, senders_path)
    }

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir creation failed");
        })
    }

    const LISTENERS: &str = r#"[{"channel": "bingo", "token": "oidor_2"}]"#;
    const SENDERS: &str =
        r#"[{"channel": "bingo", "token": "token_enviador_123", "ip_allowlist": ["0.0.0.0"]}]"#;

    #[tokio::test]
    async fn file_store_loads_both_roles() {
        let dir = tempdir();
        let store = write_files(&dir, LISTENERS, SENDERS);

        let set = store.load().await;
        let Ok(set) = set else {
            panic!("load failed");
        };
        assert_eq!(set.listener_count(), 1);
        assert_eq!(set.sender_count(), 1);
        assert!(set.validate_listener("bingo", "oidor_2").is_ok());
    }

    #[tokio::test]
    async fn file_store_missing_file_is_unavailable() {
        let dir = tempdir();
        let store = FileCredentialStore::new(
            dir.path().join("absent.json"),
            dir.path().join("absent2.json"),
        );
        let result = store.load().await;
        assert!(matches!(
            result,
            Err(RelayError::CredentialStoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn file_store_malformed_json_is_unavailable() {
        let dir = tempdir();
        let store = write_files(&dir, "not json", SENDERS);
        let result = store.load().await;
        assert!(matches!(
            result,
            Err(RelayError::CredentialStoreUnavailable(_))
        ));
    }

    #[test]
    fn source_parse_accepts_known_selectors() {
        assert_eq!(
            CredentialSource::parse("file").ok(),
            Some(CredentialSource::File)
        );
        assert_eq!(
            CredentialSource::parse("database").ok(),
            Some(CredentialSource::Database)
        );
    }

    #[test]
    fn source_parse_rejects_unknown_selector() {
        let result = CredentialSource::parse("json_remote");
        assert!(matches!(result, Err(RelayError::InvalidSource(_))));
    }

    #[tokio::test]
    async fn initialize_fails_when_source_unreadable() {
        let dir = tempdir();
        let store = FileCredentialStore::new(
            dir.path().join("absent.json"),
            dir.path().join("absent2.json"),
        );
        let result = CredentialCache::initialize(store, None, CredentialSource::File).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let dir = tempdir();
        let store = write_files(&dir, LISTENERS, SENDERS);
        let cache = CredentialCache::initialize(store, None, CredentialSource::File).await;
        let Ok(cache) = cache else {
            panic!("initialize failed");
        };

        // Database source is not configured, so this reload must fail.
        let result = cache.reload(CredentialSource::Database).await;
        assert!(result.is_err());

        let snapshot = cache.snapshot().await;
        assert!(snapshot.validate_listener("bingo", "oidor_2").is_ok());
        assert_eq!(cache.active_source().await, CredentialSource::File);
    }

    #[tokio::test]
    async fn successful_reload_swaps_snapshot() {
        let dir = tempdir();
        let store = write_files(&dir, LISTENERS, SENDERS);
        let listeners_path = dir.path().join("listeners.json");
        let cache = CredentialCache::initialize(store, None, CredentialSource::File).await;
        let Ok(cache) = cache else {
            panic!("initialize failed");
        };

        std::fs::write(
            &listeners_path,
            r#"[{"channel": "rifas", "token": "rifa_recibir"}]"#,
        )
        .ok();

        let result = cache.reload(CredentialSource::File).await;
        assert!(result.is_ok());

        let snapshot = cache.snapshot().await;
        assert!(snapshot.validate_listener("rifas", "rifa_recibir").is_ok());
        assert!(snapshot.validate_listener("bingo", "oidor_2").is_err());
        assert_eq!(cache.active_source().await, CredentialSource::File);
    }

    #[tokio::test]
    async fn snapshot_and_source_are_paired_under_one_guard() {
        let dir = tempdir();
        let store = write_files(&dir, LISTENERS, SENDERS);
        let cache = CredentialCache::initialize(store, None, CredentialSource::File).await;
        let Ok(cache) = cache else {
            panic!("initialize failed");
        };

        cache.reload(CredentialSource::File).await.ok();

        // One read guard yields both the snapshot and the selector it was
        // loaded from; a reader can never pair a snapshot from one source
        // with the selector of another.
        let active = cache.active.read().await;
        assert_eq!(active.source, CredentialSource::File);
        assert!(active.set.validate_listener("bingo", "oidor_2").is_ok());
    }
}
