//! Sweep orchestration.
//!
//! A sweep takes the ranked domain list and produces exactly one row per
//! domain. Domains are admitted in list order through a fair semaphore (the
//! worker pool), each one driven by its own task through fetch, retry waits and
//! evaluation. All rows go through one writer task.
//!
//! `Sweep` holds the injected pieces (fetcher, evaluators, settings) and runs
//! without touching the network or the filesystem on its own, so tests can
//! drive it with a fake fetcher and paused time. `run_sweep` wires it to the
//! real fetcher and the configured sinks.

mod host_limiter;
mod pipeline;
mod state;
mod task;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregate::aggregate;
use crate::app::{print_error_statistics, print_summary, shutdown_gracefully, spawn_progress_logger};
use crate::config::{Config, RATE_LIMIT_BURST_FACTOR};
use crate::domain::{load_domain_list, DomainEntry};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::fetch::{FetchResult, FetcherOptions, FetchStatus, HttpFetcher, PageFetcher};
use crate::initialization::{init_client, init_rate_limiter, init_resolver, init_semaphore};
use crate::storage::{
    spawn_writer, update_run_stats, CsvSink, RowSink, RunMetadata, RunStats, SqliteSink,
    WriterSummary,
};

pub use host_limiter::HostRateLimiter;
pub use pipeline::{Evaluation, EvaluationPipeline};
pub use state::{next_state, DomainState, RetryPolicy};
pub use task::SweepProgress;

use task::{cancelled_row, process_domain, TaskContext};

/// Orchestration knobs taken from `Config`.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub workers: usize,
    pub host_interval: Duration,
    /// Global requests per second; 0 disables the global limit.
    pub rate_limit_rps: u32,
    pub retry: RetryPolicy,
    pub sweep_timeout: Option<Duration>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SweepSettings {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.workers,
            host_interval: config.host_interval(),
            rate_limit_rps: config.rate_limit_rps,
            retry: config.retry_policy(),
            sweep_timeout: config.sweep_timeout(),
        }
    }
}

/// What one `Sweep::run` did.
#[derive(Clone)]
pub struct SweepOutcome {
    pub total_domains: usize,
    pub summary: WriterSummary,
    pub stats: Arc<ProcessingStats>,
    /// True when the sweep was cancelled before every domain finished normally.
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// A sweep over a list of domains with injected fetcher and evaluators.
pub struct Sweep {
    fetcher: Arc<dyn PageFetcher>,
    pipeline: EvaluationPipeline,
    settings: SweepSettings,
}

impl Sweep {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: SweepSettings) -> Self {
        Self {
            fetcher,
            pipeline: EvaluationPipeline::default(),
            settings,
        }
    }

    pub fn with_pipeline(mut self, pipeline: EvaluationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Processes every entry and writes one row per entry to `sinks`.
    ///
    /// Cancelling `cancel` (or reaching the sweep timeout) stops dispatching:
    /// domains in flight end as `CANCELLED` and domains never started still get
    /// a `CANCELLED` row.
    ///
    /// # Errors
    ///
    /// Returns an error only if the writer task itself panicked.
    pub async fn run(
        &self,
        entries: Vec<DomainEntry>,
        sinks: Vec<Box<dyn RowSink>>,
        cancel: CancellationToken,
    ) -> Result<SweepOutcome> {
        let start = Instant::now();
        let total_domains = entries.len();
        let cancel = cancel.child_token();
        let stats = Arc::new(ProcessingStats::new());
        let progress = Arc::new(SweepProgress::default());
        progress.total.store(total_domains, Ordering::SeqCst);

        let (rows, writer) = spawn_writer(sinks, Arc::clone(&stats));

        let rate_burst = std::cmp::min(
            self.settings.workers,
            self.settings
                .rate_limit_rps
                .saturating_mul(RATE_LIMIT_BURST_FACTOR) as usize,
        );
        let (request_limiter, limiter_shutdown) =
            match init_rate_limiter(self.settings.rate_limit_rps, rate_burst) {
                Some((limiter, shutdown)) => (Some(limiter), Some(shutdown)),
                None => (None, None),
            };

        let timeout_task = self.settings.sweep_timeout.map(|limit| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {
                        warn!("Sweep timeout of {}s reached, cancelling", limit.as_secs());
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            })
        });

        let logging_cancel = CancellationToken::new();
        let logging_task =
            spawn_progress_logger(start, Arc::clone(&progress), logging_cancel.clone());

        let ctx = Arc::new(TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            pipeline: self.pipeline.clone(),
            semaphore: init_semaphore(self.settings.workers),
            host_limiter: HostRateLimiter::new(self.settings.host_interval),
            request_limiter,
            policy: self.settings.retry,
            stats: Arc::clone(&stats),
            progress: Arc::clone(&progress),
            rows,
            cancel: cancel.clone(),
        });

        let mut tasks = FuturesUnordered::new();
        let mut pending = entries.into_iter();
        while let Some(entry) = pending.next() {
            let Some(permit) = ctx.acquire_slot().await else {
                let skipped: Vec<_> = std::iter::once(entry).chain(pending.by_ref()).collect();
                info!("Sweep cancelled, {} domains never started", skipped.len());
                for entry in skipped {
                    stats.increment_error(ErrorType::Cancelled);
                    ctx.emit(cancelled_row(&entry, 0)).await;
                }
                break;
            };
            let handle = tokio::spawn(process_domain(Arc::clone(&ctx), entry.clone(), permit));
            tasks.push(async move { (entry, handle.await) });
        }

        while let Some((entry, joined)) = tasks.next().await {
            if let Err(e) = joined {
                warn!("Task for {} panicked: {e}", entry.hostname);
                stats.increment_error(ErrorType::EvaluationPanic);
                let fetch = FetchResult::failed(entry.clone(), FetchStatus::Cancelled, 0);
                let row = aggregate(&entry, &fetch, None, None, None)
                    .with_failure_reason(format!("task panicked: {e}"));
                ctx.emit(row).await;
            }
        }

        let cancelled = cancel.is_cancelled();
        if let Some(task) = timeout_task {
            task.abort();
        }
        // Last sender goes with the context; the writer then drains and stops
        drop(ctx);
        let summary = writer.await.context("Dataset writer task failed")?;
        shutdown_gracefully(logging_cancel, Some(logging_task), limiter_shutdown).await;

        Ok(SweepOutcome {
            total_domains,
            summary,
            stats,
            cancelled,
            elapsed: start.elapsed(),
        })
    }
}

/// Results of a sweep run.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Domains in the input list after normalization and de-duplication
    pub total_domains: usize,
    /// Rows written this run (one per domain)
    pub rows_written: usize,
    pub success: usize,
    pub partial: usize,
    pub failure: usize,
    /// True if the sweep was cancelled (Ctrl-C or sweep timeout)
    pub cancelled: bool,
    /// CSV dataset the rows were appended to
    pub output: PathBuf,
    /// SQLite mirror, when enabled
    pub db_path: Option<PathBuf>,
    /// Run identifier (format: `run_<timestamp_millis>`)
    pub run_id: String,
    pub elapsed_seconds: f64,
}

/// Runs a sweep with the provided configuration.
///
/// Reads the ranked domain list, fetches and evaluates every domain, and
/// appends one row per domain to the CSV dataset (and the SQLite mirror when
/// `db_path` is set).
///
/// # Errors
///
/// Only setup failures abort a sweep:
/// - Invalid configuration
/// - Unreadable input list
/// - Output dataset that cannot be opened, or has a different header
/// - SQLite mirror or HTTP client initialization failure
///
/// Everything that goes wrong for a single domain is recorded in its row.
///
/// # Example
///
/// ```no_run
/// use water::{run_sweep, Config};
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     file: PathBuf::from("top-sites.csv"),
///     ..Default::default()
/// };
/// let report = run_sweep(config).await?;
/// println!("{} rows written", report.rows_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(config: Config) -> Result<SweepReport> {
    run_sweep_with_cancel(config, CancellationToken::new()).await
}

/// Like [`run_sweep`], stopping early when `cancel` fires.
pub async fn run_sweep_with_cancel(config: Config, cancel: CancellationToken) -> Result<SweepReport> {
    config.validate().context("Invalid configuration")?;

    let entries = load_domain_list(&config.file, &config.tier_boundaries())
        .context("Failed to read the domain list")?;
    let csv_sink = CsvSink::open(&config.output)
        .with_context(|| format!("Failed to open dataset {}", config.output.display()))?;

    let start_time_epoch = Utc::now().timestamp_millis();
    let run_id = format!("run_{start_time_epoch}");
    info!("Starting run: {run_id}");

    let mut sinks: Vec<Box<dyn RowSink>> = vec![Box::new(csv_sink)];
    let mirror = match &config.db_path {
        Some(db_path) => {
            let sink = SqliteSink::open(
                db_path,
                &RunMetadata {
                    run_id: &run_id,
                    start_time_ms: start_time_epoch,
                    version: env!("CARGO_PKG_VERSION"),
                },
            )
            .await
            .context("Failed to initialize the SQLite mirror")?;
            sinks.push(Box::new(sink.clone()));
            Some(sink)
        }
        None => None,
    };

    let client = init_client(&config).context("Failed to initialize HTTP client")?;
    let resolver = init_resolver();
    let fetcher = HttpFetcher::new(client, Some(resolver), FetcherOptions::from(&config));

    let outcome = Sweep::new(Arc::new(fetcher), SweepSettings::from(&config))
        .run(entries, sinks, cancel)
        .await?;
    let elapsed_seconds = outcome.elapsed.as_secs_f64();

    if let Some(mirror) = &mirror {
        update_run_stats(
            mirror.pool(),
            &RunStats {
                run_id: &run_id,
                total_domains: outcome.total_domains,
                success_count: outcome.summary.success,
                partial_count: outcome.summary.partial,
                failure_count: outcome.summary.failure,
                elapsed_seconds,
            },
        )
        .await
        .context("Failed to update run statistics")?;

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(mirror.pool())
            .await
        {
            warn!("Failed to checkpoint WAL file (this is non-critical): {e}");
        }
    }

    print_error_statistics(&outcome.stats);
    print_summary(&outcome.summary, outcome.cancelled, elapsed_seconds);

    Ok(SweepReport {
        total_domains: outcome.total_domains,
        rows_written: outcome.summary.rows_written,
        success: outcome.summary.success,
        partial: outcome.summary.partial,
        failure: outcome.summary.failure,
        cancelled: outcome.cancelled,
        output: config.output.clone(),
        db_path: config.db_path.clone(),
        run_id,
        elapsed_seconds,
    })
}
