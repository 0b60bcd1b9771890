//! Data transfer objects for the REST API.

pub mod channel_dto;
pub mod publish_dto;

pub use channel_dto::{
    ActiveChannelsResponse, ChannelStatusDto, LogEntryDto, ReloadRequest, ReloadResponse,
};
pub use publish_dto::{PublishRequest, PublishResponse};
