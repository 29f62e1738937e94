//! Client for a QuickChart-compatible render service (`POST chart`).
use crate::ChartRenderer;
use crate::model::ChartDefinition;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;
use threadcount_common::{Result, ThreadcountError};
use threadcount_http::{HttpClient, RequestOpts};

pub const QUICKCHART_ENDPOINT: &str = "https://quickchart.io/";

/// PNG files start with this signature.
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    chart: &'a ChartDefinition,
    width: u32,
    height: u32,
    format: &'static str,
    background_color: &'static str,
}

#[derive(Clone, Debug)]
pub struct QuickChartClient {
    http: HttpClient,
    width: u32,
    height: u32,
}

impl QuickChartClient {
    pub fn new(endpoint: &str, width: u32, height: u32) -> Result<Self> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| ThreadcountError::Config(format!("chart endpoint: {e}")))?
            .with_timeout(Duration::from_secs(30));
        Ok(Self {
            http,
            width,
            height,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl ChartRenderer for QuickChartClient {
    async fn render(&self, chart: &ChartDefinition) -> Result<Bytes> {
        let body = RenderRequest {
            chart,
            width: self.width,
            height: self.height,
            format: "png",
            background_color: "white",
        };
        let png = self
            .http
            .post_json_for_bytes("chart", &body, RequestOpts::default())
            .await
            .map_err(|e| ThreadcountError::Chart(e.to_string()))?;

        if !png.starts_with(PNG_MAGIC) {
            return Err(ThreadcountError::Chart(format!(
                "render service returned {} bytes that are not a PNG",
                png.len()
            )));
        }
        tracing::info!(bytes = png.len(), width = self.width, height = self.height, "chart.render");
        Ok(png)
    }
}
