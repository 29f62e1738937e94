//! FediDB software listing (`GET v1/software`).
pub mod client;
pub mod types;

pub use client::FediDbClient;
