//! Loader for bot configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//!
//! 1. serde defaults on every section (a bare `{}` is a valid config),
//! 2. the YAML file (`threadcount.yaml` by default, optional),
//! 3. `THREADCOUNT__SECTION__KEY` environment variables.
//!
//! String values may reference `${VAR}`; references are expanded recursively
//! after the sources are merged. Unknown variables are left untouched.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

const MAX_EXPANSION_PASSES: usize = 8;
const ENV_PREFIX: &str = "THREADCOUNT";
const TOKEN_ENV: &str = "MASTODON_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadcountConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub delta: DeltaWindow,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where user counts come from and how they are labelled in posts.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_stats_endpoint")]
    pub endpoint: String,
    /// Software names, matched case-insensitively against the listing.
    #[serde(default = "default_software")]
    pub software: Vec<String>,
    /// How many entries of the software listing to request.
    #[serde(default = "default_listing_limit")]
    pub limit: u32,
    /// Name used in the status text, e.g. "Lemmy/kbin accounts".
    #[serde(default = "default_label")]
    pub label: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stats_endpoint(),
            software: default_software(),
            limit: default_listing_limit(),
            label: default_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MastodonConfig {
    #[serde(default = "default_instance")]
    pub instance: String,
    /// Falls back to `$MASTODON_TOKEN` when not configured.
    #[serde(default = "default_access_token")]
    pub access_token: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            access_token: default_access_token(),
            visibility: default_visibility(),
        }
    }
}

/// Backing key-value store for the per-software histories.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Nothing survives the process; useful for dry runs.
    Memory,
    File {
        #[serde(default = "default_store_dir")]
        dir: PathBuf,
    },
    /// Cloudflare Workers KV over the REST API.
    Cloudflare {
        account_id: String,
        namespace_id: String,
        api_token: String,
        #[serde(default = "default_cloudflare_endpoint")]
        endpoint: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_store_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_chart_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
    /// Alt text attached to the uploaded image.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_chart_endpoint(),
            width: default_chart_width(),
            height: default_chart_height(),
            description: None,
        }
    }
}

/// Lookback used for the "+N in the last hour" line.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(tag = "window", rename_all = "lowercase")]
pub enum DeltaWindow {
    /// Compare against the sample `count` positions back.
    Samples { count: usize },
    /// Compare against the sample closest to `minutes` ago.
    Minutes { minutes: u32 },
}

impl Default for DeltaWindow {
    fn default() -> Self {
        DeltaWindow::Samples { count: 1 }
    }
}

/// Cron expressions of the two scheduled triggers.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_fetch_cron")]
    pub fetch: String,
    #[serde(default = "default_post_cron")]
    pub post: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fetch: default_fetch_cron(),
            post: default_post_cron(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
            dir: None,
            stderr: true,
        }
    }
}

/// Outbound HTTP settings. Calls are never retried: a failure ends the cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_stats_endpoint() -> String {
    "https://api.fedidb.org/v1/".into()
}
fn default_software() -> Vec<String> {
    vec!["lemmy".into(), "kbin".into()]
}
fn default_listing_limit() -> u32 {
    40
}
fn default_label() -> String {
    "Lemmy/kbin".into()
}
fn default_instance() -> String {
    "https://botsin.space".into()
}
fn default_access_token() -> String {
    std::env::var(TOKEN_ENV).unwrap_or_default()
}
fn default_visibility() -> String {
    "public".into()
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("threadcount-data")
}
fn default_cloudflare_endpoint() -> String {
    "https://api.cloudflare.com/client/v4/".into()
}
fn default_chart_endpoint() -> String {
    "https://quickchart.io/".into()
}
fn default_chart_width() -> u32 {
    800
}
fn default_chart_height() -> u32 {
    400
}
fn default_fetch_cron() -> String {
    "*/30 * * * *".into()
}
fn default_post_cron() -> String {
    "0 * * * *".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    15
}

impl ThreadcountConfig {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats.software.is_empty() {
            return Err(ConfigError::Message(
                "stats.software must name at least one software".into(),
            ));
        }
        if self.stats.software.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Message(
                "stats.software entries must not be blank".into(),
            ));
        }
        if let StoreConfig::Cloudflare {
            account_id,
            namespace_id,
            api_token,
            ..
        } = &self.store
        {
            for (name, value) in [
                ("account_id", account_id),
                ("namespace_id", namespace_id),
                ("api_token", api_token),
            ] {
                if value.trim().is_empty() || value.contains("${") {
                    return Err(ConfigError::Message(format!(
                        "store.{name} is required for the cloudflare store"
                    )));
                }
            }
        }
        let mut endpoints = vec![
            ("stats.endpoint", self.stats.endpoint.as_str()),
            ("mastodon.instance", self.mastodon.instance.as_str()),
            ("chart.endpoint", self.chart.endpoint.as_str()),
        ];
        if let StoreConfig::Cloudflare { endpoint, .. } = &self.store {
            endpoints.push(("store.endpoint", endpoint.as_str()));
        }
        for (name, raw) in endpoints {
            match Url::parse(raw) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                Ok(_) | Err(_) => {
                    return Err(ConfigError::Message(format!(
                        "{name} must be an http(s) URL, got {raw:?}"
                    )));
                }
            }
        }
        if let DeltaWindow::Samples { count: 0 } = self.delta {
            return Err(ConfigError::Message(
                "delta.count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `$VAR` / `${VAR}` until the string stops changing or the depth runs out.
/// Unset variables stay literal; set ones around them are still expanded.
fn expand_env(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAX_EXPANSION_PASSES {
        let next = shellexpand::env_with_context_no_errors(&current, |name| {
            std::env::var(name).ok()
        })
        .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn expand_strings(value: &mut Value) {
    match value {
        Value::String(s) if s.contains('$') => *s = expand_env(s),
        Value::Array(items) => items.iter_mut().for_each(expand_strings),
        Value::Object(fields) => fields.values_mut().for_each(expand_strings),
        _ => {}
    }
}

/// Layers YAML sources; `THREADCOUNT__` env vars always go on top.
pub struct ThreadcountConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ThreadcountConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadcountConfigLoader {
    /// Start from the defaults; `THREADCOUNT__` env overrides are applied last in [`load`](Self::load).
    ///
    /// ```
    /// use threadcount_config::{StoreConfig, ThreadcountConfigLoader};
    ///
    /// let config = ThreadcountConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nstore:\n  kind: memory")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.store, StoreConfig::Memory);
    /// assert_eq!(config.stats.software, vec!["lemmy", "kbin"]);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Required file; format follows the extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so env-only deployments work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Inline YAML, merged like a file.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge, expand `${VAR}` references, deserialize and [`validate`](ThreadcountConfig::validate).
    ///
    /// ```
    /// use threadcount_config::{DeltaWindow, ThreadcountConfigLoader};
    ///
    /// unsafe { std::env::set_var("DOC_MASTODON_TOKEN", "injected-from-env"); }
    ///
    /// let config = ThreadcountConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// mastodon:
    ///   instance: "https://mastodon.example"
    ///   access_token: "${DOC_MASTODON_TOKEN}"
    /// delta:
    ///   window: minutes
    ///   minutes: 60
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.mastodon.access_token, "injected-from-env");
    /// assert_eq!(config.mastodon.visibility, "public");
    /// assert_eq!(config.delta, DeltaWindow::Minutes { minutes: 60 });
    ///
    /// unsafe { std::env::remove_var("DOC_MASTODON_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<ThreadcountConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("stats.software"),
            )
            .build()?;

        let mut raw: Value = cfg.try_deserialize()?;
        // No sources at all deserializes as unit.
        if raw.is_null() {
            raw = Value::Object(Default::default());
        }
        expand_strings(&mut raw);

        let typed: ThreadcountConfig =
            serde_json::from_value(raw).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
