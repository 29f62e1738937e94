//! Mastodon REST API: media upload (`api/v2/media`) and status creation (`api/v1/statuses`).
pub mod client;
pub mod types;

pub use client::MastodonClient;
