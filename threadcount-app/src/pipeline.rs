//! One scheduled invocation: fetch, append, summarise and (optionally) post.
//!
//! Stages run strictly in sequence and the first failure ends the cycle. The
//! next scheduled run starts from whatever was persisted.
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use threadcount_chart::{ChartRenderer, build_chart};
use threadcount_common::{Result, ThreadcountError};
use threadcount_config::{DeltaWindow, ScheduleConfig, ThreadcountConfig};
use threadcount_history::{History, HistoryStore, Sample, UserCount, combined_latest, diff_since};
use threadcount_social::{
    MediaUploader, NewStatus, Status, StatusPublisher, StatusSummary, Visibility, format_status,
};
use threadcount_stats::StatsSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    FetchOnly,
    FetchAndPost,
}

impl PipelineMode {
    /// Map a fired trigger onto its variant. `schedule.post` wins when both
    /// expressions are the same; a trigger matching neither is a config error.
    pub fn from_cron(expr: &str, schedule: &ScheduleConfig) -> Result<Self> {
        let fired = normalize_cron(expr);
        if fired == normalize_cron(&schedule.post) {
            Ok(PipelineMode::FetchAndPost)
        } else if fired == normalize_cron(&schedule.fetch) {
            Ok(PipelineMode::FetchOnly)
        } else {
            Err(ThreadcountError::Config(format!(
                "trigger {fired:?} matches neither schedule.post nor schedule.fetch"
            )))
        }
    }
}

fn normalize_cron(expr: &str) -> String {
    expr.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// External collaborators of a cycle.
pub struct CycleDeps {
    pub stats: Arc<dyn StatsSource>,
    pub store: HistoryStore,
    /// `None` posts text only.
    pub chart: Option<Arc<dyn ChartRenderer>>,
    pub uploader: Arc<dyn MediaUploader>,
    pub publisher: Arc<dyn StatusPublisher>,
}

#[derive(Debug)]
pub struct CycleReport {
    pub mode: PipelineMode,
    pub counts: Vec<(String, UserCount)>,
    pub summary: StatusSummary,
    pub message: String,
    pub media_id: Option<String>,
    pub posted: Option<Status>,
}

#[tracing::instrument(skip_all, fields(mode = ?mode))]
pub async fn run_cycle(
    cfg: &ThreadcountConfig,
    mode: PipelineMode,
    deps: &CycleDeps,
) -> Result<CycleReport> {
    let visibility = Visibility::parse(&cfg.mastodon.visibility).ok_or_else(|| {
        ThreadcountError::Config(format!(
            "unknown mastodon.visibility {:?}",
            cfg.mastodon.visibility
        ))
    })?;

    let counts = deps.stats.fetch_all(&cfg.stats.software).await?;

    let now = Utc::now();
    let mut histories = Vec::with_capacity(counts.len());
    for (software, users) in &counts {
        let history = deps.store.append(software, Sample::new(now, *users)).await?;
        histories.push((software.clone(), history));
    }

    let summary = summarize(&histories, cfg.delta, now);
    let message = format_status(&summary, &cfg.stats.label);
    tracing::info!(
        total = summary.total,
        delta = summary.delta,
        mau = summary.mau,
        "cycle.summary"
    );

    let mut report = CycleReport {
        mode,
        counts,
        summary,
        message,
        media_id: None,
        posted: None,
    };
    if mode == PipelineMode::FetchOnly {
        return Ok(report);
    }

    let mut status = NewStatus::new(report.message.clone()).with_visibility(visibility);
    if let Some(renderer) = &deps.chart {
        let series: Vec<(&str, &History)> =
            histories.iter().map(|(name, h)| (name.as_str(), h)).collect();
        let title = format!("{} accounts", cfg.stats.label);
        if let Some(chart) = build_chart(&series, &title) {
            let png = renderer.render(&chart).await?;
            let description = cfg
                .chart
                .description
                .clone()
                .unwrap_or_else(|| format!("Line chart of {title} over the last two weeks"));
            let media = deps.uploader.upload_media(png, &description).await?;
            status = status.with_media(media.id.clone());
            report.media_id = Some(media.id);
        }
    }

    report.posted = Some(deps.publisher.post_status(&status).await?);
    Ok(report)
}

/// Combined totals of the latest samples plus the change over `window`.
pub fn summarize(
    histories: &[(String, History)],
    window: DeltaWindow,
    now: DateTime<Utc>,
) -> StatusSummary {
    let latest = combined_latest(histories.iter().map(|(_, h)| h));
    let delta = match window {
        DeltaWindow::Samples { count } => {
            histories.iter().map(|(_, h)| h.diff(count)).sum::<i64>()
        }
        DeltaWindow::Minutes { minutes } => diff_since(
            histories.iter().map(|(_, h)| h),
            now - Duration::minutes(i64::from(minutes)),
        ),
    };
    StatusSummary {
        total: latest.total,
        delta,
        mau: latest.mau,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use threadcount_chart::ChartDefinition;
    use threadcount_common::Stage;
    use threadcount_history::MemoryKv;
    use threadcount_social::MediaAttachment;

    struct FixedStats(Mutex<HashMap<&'static str, UserCount>>);

    impl FixedStats {
        fn new(lemmy: UserCount, kbin: UserCount) -> Self {
            Self(Mutex::new(HashMap::from([("lemmy", lemmy), ("kbin", kbin)])))
        }

        fn set(&self, software: &'static str, users: UserCount) {
            self.0.lock().unwrap().insert(software, users);
        }
    }

    #[async_trait]
    impl StatsSource for FixedStats {
        async fn fetch(&self, software: &str) -> Result<UserCount> {
            Ok(self.0.lock().unwrap().get(software).copied().unwrap_or_default())
        }
    }

    struct DownStats;

    #[async_trait]
    impl StatsSource for DownStats {
        async fn fetch(&self, _software: &str) -> Result<UserCount> {
            Err(ThreadcountError::Fetch("server returned error 503".into()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<NewStatus>>,
        uploads: Mutex<Vec<(usize, String)>>,
        reject_posts: bool,
    }

    #[async_trait]
    impl MediaUploader for Recorder {
        async fn upload_media(&self, png: Bytes, description: &str) -> Result<MediaAttachment> {
            self.uploads
                .lock()
                .unwrap()
                .push((png.len(), description.to_string()));
            Ok(MediaAttachment {
                id: "media-1".into(),
                kind: None,
                url: None,
                description: None,
            })
        }
    }

    #[async_trait]
    impl StatusPublisher for Recorder {
        async fn post_status(&self, status: &NewStatus) -> Result<Status> {
            if self.reject_posts {
                return Err(ThreadcountError::Publish("401 invalid token".into()));
            }
            self.statuses.lock().unwrap().push(status.clone());
            Ok(Status {
                id: "status-1".into(),
                url: None,
                created_at: None,
                visibility: Some(status.visibility),
                media_attachments: Vec::new(),
            })
        }
    }

    struct FakeRenderer;

    #[async_trait]
    impl ChartRenderer for FakeRenderer {
        async fn render(&self, chart: &ChartDefinition) -> Result<Bytes> {
            assert_eq!(chart.data.datasets.len(), 3);
            Ok(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
        }
    }

    fn config() -> ThreadcountConfig {
        serde_json::from_value(json!({})).unwrap()
    }

    fn deps(
        stats: Arc<dyn StatsSource>,
        kv: Arc<MemoryKv>,
        recorder: Arc<Recorder>,
        chart: Option<Arc<dyn ChartRenderer>>,
    ) -> CycleDeps {
        CycleDeps {
            stats,
            store: HistoryStore::new(kv),
            chart,
            uploader: recorder.clone(),
            publisher: recorder,
        }
    }

    #[tokio::test]
    async fn first_post_attributes_all_accounts_to_the_last_hour() {
        let cfg = config();
        let stats = Arc::new(FixedStats::new(
            UserCount::new(1000, 200),
            UserCount::new(500, 100),
        ));
        let kv = Arc::new(MemoryKv::new());
        let recorder = Arc::new(Recorder::default());
        let deps = deps(stats.clone(), kv.clone(), recorder.clone(), None);

        let report = run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap();
        assert_eq!(
            report.summary,
            StatusSummary {
                total: 1500,
                delta: 1500,
                mau: 300
            }
        );

        let posted = recorder.statuses.lock().unwrap().clone();
        assert_eq!(posted.len(), 1);
        assert_eq!(
            posted[0].status,
            "1,500 Lemmy/kbin accounts\n+1,500 in the last hour\n300 monthly active users"
        );
        assert_eq!(posted[0].visibility, Visibility::Public);
        assert!(posted[0].media_ids.is_empty());

        // An hour later only the growth is reported.
        stats.set("lemmy", UserCount::new(1100, 210));
        run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap();
        let posted = recorder.statuses.lock().unwrap().clone();
        assert_eq!(
            posted[1].status,
            "1,600 Lemmy/kbin accounts\n+100 in the last hour\n310 monthly active users"
        );
    }

    #[tokio::test]
    async fn fetch_only_records_without_posting() {
        let cfg = config();
        let stats = Arc::new(FixedStats::new(UserCount::new(10, 1), UserCount::new(5, 1)));
        let kv = Arc::new(MemoryKv::new());
        let recorder = Arc::new(Recorder::default());
        let deps = deps(stats, kv.clone(), recorder.clone(), None);

        let report = run_cycle(&cfg, PipelineMode::FetchOnly, &deps)
            .await
            .unwrap();
        assert!(report.posted.is_none());
        assert!(recorder.statuses.lock().unwrap().is_empty());
        assert!(kv.peek("lemmy").is_some());
        assert!(kv.peek("kbin").is_some());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_anything_is_stored() {
        let cfg = config();
        let kv = Arc::new(MemoryKv::new());
        let recorder = Arc::new(Recorder::default());
        let deps = deps(Arc::new(DownStats), kv.clone(), recorder.clone(), None);

        let err = run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(kv.peek("lemmy").is_none());
        assert!(recorder.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_keeps_the_recorded_sample() {
        let cfg = config();
        let stats = Arc::new(FixedStats::new(UserCount::new(10, 1), UserCount::new(5, 1)));
        let kv = Arc::new(MemoryKv::new());
        let recorder = Arc::new(Recorder {
            reject_posts: true,
            ..Default::default()
        });
        let deps = deps(stats, kv.clone(), recorder, None);

        let err = run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Publish);
        assert!(kv.peek("lemmy").is_some());
    }

    #[tokio::test]
    async fn chart_is_rendered_uploaded_and_attached() {
        let mut cfg = config();
        cfg.chart.description = Some("Accounts chart".into());
        let stats = Arc::new(FixedStats::new(UserCount::new(10, 1), UserCount::new(5, 1)));
        let kv = Arc::new(MemoryKv::new());
        let recorder = Arc::new(Recorder::default());
        let deps = deps(stats, kv, recorder.clone(), Some(Arc::new(FakeRenderer)));

        let report = run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap();
        assert_eq!(report.media_id.as_deref(), Some("media-1"));
        assert_eq!(
            recorder.uploads.lock().unwrap().clone(),
            vec![(8, "Accounts chart".to_string())]
        );
        assert_eq!(
            recorder.statuses.lock().unwrap()[0].media_ids,
            vec!["media-1".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_visibility_is_a_config_error() {
        let cfg: ThreadcountConfig =
            serde_json::from_value(json!({ "mastodon": { "visibility": "everyone" } })).unwrap();
        let stats = Arc::new(FixedStats::new(UserCount::new(1, 0), UserCount::new(1, 0)));
        let deps = deps(
            stats,
            Arc::new(MemoryKv::new()),
            Arc::new(Recorder::default()),
            None,
        );
        let err = run_cycle(&cfg, PipelineMode::FetchAndPost, &deps)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
    }

    #[test]
    fn trigger_selects_mode_by_schedule() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            PipelineMode::from_cron("0 * * * *", &schedule).unwrap(),
            PipelineMode::FetchAndPost
        );
        assert_eq!(
            PipelineMode::from_cron(" 0  *  * * * ", &schedule).unwrap(),
            PipelineMode::FetchAndPost
        );
        assert_eq!(
            PipelineMode::from_cron("*/30 * * * *", &schedule).unwrap(),
            PipelineMode::FetchOnly
        );
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        let schedule = ScheduleConfig::default();
        let err = PipelineMode::from_cron("15 3 * * *", &schedule).unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
        assert!(err.to_string().contains("15 3 * * *"));
    }

    #[test]
    fn post_schedule_wins_when_both_match() {
        let schedule = ScheduleConfig {
            fetch: "0 * * * *".into(),
            post: "0 * * * *".into(),
        };
        assert_eq!(
            PipelineMode::from_cron("0 * * * *", &schedule).unwrap(),
            PipelineMode::FetchAndPost
        );
    }

    #[test]
    fn minutes_window_compares_against_closest_sample() {
        let now = Utc::now();
        let at = |mins: i64, total: u64| {
            Sample::new(now - Duration::minutes(mins), UserCount::new(total, 0))
        };
        let lemmy: History = vec![at(120, 900), at(58, 1000), at(0, 1200)].into();
        let kbin: History = vec![at(61, 400), at(0, 450)].into();
        let histories = vec![("lemmy".to_string(), lemmy), ("kbin".to_string(), kbin)];

        let summary = summarize(&histories, DeltaWindow::Minutes { minutes: 60 }, now);
        assert_eq!(summary.total, 1650);
        assert_eq!(summary.delta, (1200 + 450) - (1000 + 400));

        let by_samples = summarize(&histories, DeltaWindow::Samples { count: 2 }, now);
        // kbin has only two samples, so its whole latest total counts.
        assert_eq!(by_samples.delta, (1200 - 900) + 450);
    }
}
