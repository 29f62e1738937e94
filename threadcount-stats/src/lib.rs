//! Current user counts per software platform.
//!
//! [`StatsSource`] is the seam the pipeline talks to; [`fedidb::FediDbClient`]
//! is the production implementation.
pub mod fedidb;

use async_trait::async_trait;
use threadcount_common::Result;
use threadcount_history::UserCount;

pub use fedidb::FediDbClient;

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Current counts for `software`. A platform the source does not list
    /// reports zero users; transport failures are errors.
    async fn fetch(&self, software: &str) -> Result<UserCount>;

    /// Counts for every name in `software`, in the same order.
    ///
    /// Fails as a whole on the first error so no partial snapshot is stored.
    async fn fetch_all(&self, software: &[String]) -> Result<Vec<(String, UserCount)>> {
        let mut out = Vec::with_capacity(software.len());
        for name in software {
            out.push((name.clone(), self.fetch(name).await?));
        }
        Ok(out)
    }
}
