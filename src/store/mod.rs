//! Store layer: credential sources and the audit event log.
//!
//! Provides the [`credential_store::CredentialStore`] trait with file- and
//! PostgreSQL-backed implementations, the all-or-nothing reload cache, and
//! the bounded file-backed event log.

pub mod credential_store;
pub mod event_log;
pub mod postgres;

pub use credential_store::{CredentialCache, CredentialSource, CredentialStore, FileCredentialStore};
pub use event_log::{FileEventLog, LogEntry};
pub use postgres::PostgresCredentialStore;
