//! Chart descriptions of the user-count history and the client that renders them.
//!
//! Rendering is delegated to a QuickChart-compatible service: we send a
//! Chart.js description and get a PNG back.
pub mod model;
pub mod quickchart;

use async_trait::async_trait;
use bytes::Bytes;
use threadcount_common::Result;

pub use model::{ChartDefinition, Dataset, build_chart};
pub use quickchart::QuickChartClient;

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Render `chart` to PNG bytes.
    async fn render(&self, chart: &ChartDefinition) -> Result<Bytes>;
}
