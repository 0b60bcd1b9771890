//! Service layer orchestrating validation, membership, dispatch, and audit.

pub mod relay_service;

pub use relay_service::{ChannelStatus, RelayService};
