//! Builds the pipeline's collaborators from configuration.
use crate::pipeline::{CycleDeps, PipelineMode};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use threadcount_chart::{ChartRenderer, QuickChartClient};
use threadcount_common::Result;
use threadcount_config::{StoreConfig, ThreadcountConfig};
use threadcount_history::{CloudflareKv, FileKv, HistoryStore, KvStore, MemoryKv};
use threadcount_social::{
    MastodonClient, MediaAttachment, MediaUploader, NewStatus, Status, StatusPublisher,
};
use threadcount_stats::FediDbClient;

pub fn build_from_config(
    cfg: &ThreadcountConfig,
    mode: PipelineMode,
    dry_run: bool,
) -> Result<CycleDeps> {
    let timeout = Duration::from_secs(cfg.http.timeout_secs);

    let stats = FediDbClient::new(&cfg.stats.endpoint)?
        .with_limit(cfg.stats.limit)
        .with_timeout(timeout);

    let chart: Option<Arc<dyn ChartRenderer>> = if cfg.chart.enabled {
        let client: Arc<dyn ChartRenderer> = Arc::new(
            QuickChartClient::new(&cfg.chart.endpoint, cfg.chart.width, cfg.chart.height)?
                .with_timeout(timeout.max(Duration::from_secs(30))),
        );
        Some(client)
    } else {
        None
    };

    // Fetch-only runs never touch Mastodon, so they work without a token.
    let (publisher, uploader) = if dry_run || mode == PipelineMode::FetchOnly {
        let logger = Arc::new(LogOnlyPublisher);
        let publisher: Arc<dyn StatusPublisher> = logger.clone();
        let uploader: Arc<dyn MediaUploader> = logger;
        (publisher, uploader)
    } else {
        let client = Arc::new(
            MastodonClient::new(&cfg.mastodon.instance, cfg.mastodon.access_token.clone())?
                .with_timeout(timeout),
        );
        let publisher: Arc<dyn StatusPublisher> = client.clone();
        let uploader: Arc<dyn MediaUploader> = client;
        (publisher, uploader)
    };

    Ok(CycleDeps {
        stats: Arc::new(stats),
        store: history_store(cfg, dry_run)?,
        chart,
        uploader,
        publisher,
    })
}

pub fn history_store(cfg: &ThreadcountConfig, dry_run: bool) -> Result<HistoryStore> {
    let kv: Arc<dyn KvStore> = match (&cfg.store, dry_run) {
        (_, true) | (StoreConfig::Memory, _) => Arc::new(MemoryKv::new()),
        (StoreConfig::File { dir }, false) => Arc::new(FileKv::new(dir.clone())),
        (
            StoreConfig::Cloudflare {
                account_id,
                namespace_id,
                api_token,
                endpoint,
            },
            false,
        ) => {
            Arc::new(CloudflareKv::with_endpoint(
                endpoint,
                account_id,
                namespace_id,
                api_token.clone(),
            )?)
        }
    };
    tracing::debug!(backend = kv.backend(), dry_run, "history.store.ready");
    Ok(HistoryStore::new(kv))
}

/// Stand-in publisher for dry runs: logs what would have been sent.
struct LogOnlyPublisher;

#[async_trait]
impl MediaUploader for LogOnlyPublisher {
    async fn upload_media(&self, png: Bytes, description: &str) -> Result<MediaAttachment> {
        tracing::info!(bytes = png.len(), %description, "dry_run.media");
        Ok(MediaAttachment {
            id: "dry-run".into(),
            kind: Some("image".into()),
            url: None,
            description: Some(description.to_string()),
        })
    }
}

#[async_trait]
impl StatusPublisher for LogOnlyPublisher {
    async fn post_status(&self, status: &NewStatus) -> Result<Status> {
        tracing::info!(
            visibility = ?status.visibility,
            media = status.media_ids.len(),
            text = %status.status,
            "dry_run.status"
        );
        Ok(Status {
            id: "dry-run".into(),
            url: None,
            created_at: None,
            visibility: Some(status.visibility),
            media_attachments: Vec::new(),
        })
    }
}
