//! Rolling user-count history per software platform.
//!
//! A [`History`] is an ascending series of [`Sample`]s capped at
//! [`HISTORY_LENGTH`] entries (two weeks of hourly samples). The
//! [`HistoryStore`] reads it from a [`KvStore`], appends the newest sample,
//! drops the oldest overflow and writes the whole series back.
//!
//! Persisted values that fail to parse are treated as an empty history:
//! corrupt or absent state never blocks a cycle.
pub mod cloudflare;
pub mod history;
pub mod kv;
pub mod sample;
pub mod store;

pub use cloudflare::CloudflareKv;
pub use history::{HISTORY_LENGTH, History, combined_latest, diff_since};
pub use kv::{FileKv, KvStore, MemoryKv};
pub use sample::{Sample, UserCount};
pub use store::{HistoryStore, canonical_key};
