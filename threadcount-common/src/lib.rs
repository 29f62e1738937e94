//! Common types and utilities shared across threadcount crates.
//!
//! This crate holds the error type every pipeline stage reports through and
//! the tracing initialisation used by the binary and the integration tests.
//! It stays dependency-light so every other crate can pull it in.
//!
//! # Overview
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`ThreadcountError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use threadcount_common::{Stage, ThreadcountError};
//!
//! let err = ThreadcountError::Fetch("status 503".into());
//! assert_eq!(err.stage(), Stage::Fetch);
//! assert_eq!(err.to_string(), "Stats fetch failed: status 503");
//! ```

pub mod observability;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Store,
    Chart,
    Upload,
    Publish,
    Config,
}

/// Error types used across the threadcount pipeline.
///
/// Every variant is fatal for the cycle that raised it. Nothing here is
/// retried; the next scheduled cycle starts from scratch.
#[derive(thiserror::Error, Debug)]
pub enum ThreadcountError {
    /// The stats source was unreachable or answered with a non-2xx status.
    #[error("Stats fetch failed: {0}")]
    Fetch(String),

    /// The key-value store could not be read or written.
    #[error("History store error: {0}")]
    Store(String),

    /// The chart rendering service failed.
    #[error("Chart render failed: {0}")]
    Chart(String),

    /// The media upload endpoint rejected the image.
    #[error("Media upload failed: {0}")]
    Upload(String),

    /// The posting API rejected the status.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ThreadcountError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Store(_) => Stage::Store,
            Self::Chart(_) => Stage::Chart,
            Self::Upload(_) => Stage::Upload,
            Self::Publish(_) => Stage::Publish,
            Self::Config(_) => Stage::Config,
        }
    }
}

/// Convenient alias for results that use [`ThreadcountError`].
pub type Result<T> = std::result::Result<T, ThreadcountError>;
