use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use threadcount_common::observability::{LogConfig, LogFormat, init_logging};
use threadcount_config::{ThreadcountConfig, ThreadcountConfigLoader};
use threadcount_history::HISTORY_LENGTH;

use pipeline::{PipelineMode, run_cycle};
mod pipeline;
mod wiring;

const DEFAULT_CONFIG: &str = "threadcount.yaml";

#[derive(Parser)]
#[command(name = "threadcount")]
#[command(about = "Hourly Lemmy/kbin account counts, posted to Mastodon")]
#[command(version)]
struct Cli {
    /// Config file; `threadcount.yaml` is used when present.
    #[arg(long, global = true, env = "THREADCOUNT_CONFIG")]
    config: Option<PathBuf>,

    /// Log the status instead of posting it and keep history in memory.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current counts and append them to the history.
    Fetch,
    /// Fetch, append, then post the summary.
    Post,
    /// Run the variant a scheduled trigger selects.
    Trigger {
        /// Cron expression of the trigger that fired.
        #[arg(long)]
        cron: String,
    },
    /// Print the stored history of one software.
    Show { software: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Env wins over the file.
    let loader = match &cli.config {
        Some(path) => ThreadcountConfigLoader::new().with_file(path),
        None => ThreadcountConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let cfg: ThreadcountConfig = loader.load().context("loading configuration")?;

    let log_path = init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: LogFormat::parse(&cfg.logging.format),
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })?;
    tracing::debug!(path = %log_path.display(), "logging.ready");

    let mode = match &cli.command {
        Commands::Fetch => PipelineMode::FetchOnly,
        Commands::Post => PipelineMode::FetchAndPost,
        Commands::Trigger { cron } => PipelineMode::from_cron(cron, &cfg.schedule)?,
        Commands::Show { software } => return show(&cfg, software).await,
    };

    let deps = wiring::build_from_config(&cfg, mode, cli.dry_run)?;
    match run_cycle(&cfg, mode, &deps).await {
        Ok(report) => {
            tracing::info!(
                ?mode,
                total = report.summary.total,
                delta = report.summary.delta,
                mau = report.summary.mau,
                posted = report.posted.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
                "cycle.done"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(?mode, stage = ?e.stage(), error = %e, "cycle.failed");
            Err(e.into())
        }
    }
}

async fn show(cfg: &ThreadcountConfig, software: &str) -> Result<()> {
    let store = wiring::history_store(cfg, false)?;
    let history = store.load(software).await?;
    let (Some(first), Some(latest)) = (history.samples().first(), history.latest()) else {
        println!("{software}: no samples");
        return Ok(());
    };
    println!("{software}: {}/{HISTORY_LENGTH} samples", history.len());
    println!("  first   {}", first.date.to_rfc3339());
    println!(
        "  latest  {}  total={} mau={}",
        latest.date.to_rfc3339(),
        latest.users.total,
        latest.users.mau
    );
    println!("  change since previous sample: {:+}", history.diff(1));
    Ok(())
}
