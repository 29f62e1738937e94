//! Publishing side of the bot: the status text and the Mastodon client that posts it.
//!
//! The pipeline only talks to the [`StatusPublisher`] and [`MediaUploader`] traits so a
//! dry run or a test can stand in for the real instance.
use async_trait::async_trait;
use bytes::Bytes;
use threadcount_common::Result;

pub mod format;
pub mod mastodon;

pub use format::{StatusSummary, format_status, group_thousands};
pub use mastodon::MastodonClient;
pub use mastodon::types::{MediaAttachment, NewStatus, Status, Visibility};

/// Uploads one image and returns the id the instance assigned to it.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload_media(&self, png: Bytes, description: &str) -> Result<MediaAttachment>;
}

/// Creates a new status.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn post_status(&self, status: &NewStatus) -> Result<Status>;
}
