//! Domain layer: core types, channel registry, and event system.
//!
//! This module contains the server-side domain model including connection
//! identity, credential snapshots with access validation, the event bus for
//! broadcasting published events, and the channel registry tracking live
//! membership.

pub mod connection_id;
pub mod credentials;
pub mod event_bus;
pub mod registry;
pub mod relay_event;

pub use connection_id::ConnectionId;
pub use credentials::{CredentialSet, ListenerCredential, SenderCredential};
pub use event_bus::EventBus;
pub use registry::ChannelRegistry;
pub use relay_event::RelayEvent;
