//! Per-domain task processing.
//!
//! One task per domain drives the state machine from its first fetch to the
//! row it puts on the sink channel. Every path through `run_domain` ends in a
//! row, whether the domain was evaluated, failed, or cancelled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::host_limiter::HostRateLimiter;
use super::pipeline::{Evaluation, EvaluationPipeline};
use super::state::{next_state, DomainState, RetryPolicy};
use crate::aggregate::{aggregate, ResultRow, RowOutcome};
use crate::domain::DomainEntry;
use crate::error_handling::{update_error_stats, ErrorType, InfoType, ProcessingStats, WarningType};
use crate::fetch::{FetchResult, PageFetcher};
use crate::initialization::RateLimiter;
use crate::metrics::MetricFeature;

/// Completed-domain counters read by the progress logger.
#[derive(Debug, Default)]
pub struct SweepProgress {
    pub total: AtomicUsize,
    pub completed: AtomicUsize,
    pub failed: AtomicUsize,
}

impl SweepProgress {
    pub(super) fn record(&self, outcome: RowOutcome) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if outcome == RowOutcome::Failure {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Shared state handed to every domain task.
pub(super) struct TaskContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub pipeline: EvaluationPipeline,
    pub semaphore: Arc<Semaphore>,
    pub host_limiter: HostRateLimiter,
    pub request_limiter: Option<Arc<RateLimiter>>,
    pub policy: RetryPolicy,
    pub stats: Arc<ProcessingStats>,
    pub progress: Arc<SweepProgress>,
    pub rows: mpsc::Sender<ResultRow>,
    pub cancel: CancellationToken,
}

impl TaskContext {
    /// Hands a finished row to the writer.
    pub(super) async fn emit(&self, row: ResultRow) {
        self.progress.record(row.outcome);
        if let Err(e) = self.rows.send(row).await {
            warn!("Writer gone, dropping row for {}", e.0.hostname);
        }
    }

    /// Waits for a worker slot, or returns `None` once the sweep is cancelled.
    pub(super) async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
        }
    }
}

/// Row recorded for a domain whose processing was cut short by cancellation.
pub(super) fn cancelled_row(entry: &DomainEntry, attempts: u32) -> ResultRow {
    let fetch = FetchResult::cancelled(entry.clone());
    aggregate(entry, &fetch, None, None, None).with_attempts(attempts)
}

/// Processes one domain and sends its row to the writer.
///
/// `permit` is the worker slot the dispatcher acquired for this domain. It is
/// released while the domain waits for a retry and re-acquired afterwards.
pub(super) async fn process_domain(
    ctx: Arc<TaskContext>,
    entry: DomainEntry,
    permit: OwnedSemaphorePermit,
) {
    let row = run_domain(&ctx, &entry, permit).await;
    debug!(
        "{} finished as {} after {} attempt(s)",
        row.hostname, row.outcome, row.attempts
    );
    ctx.emit(row).await;
}

async fn run_domain(ctx: &TaskContext, entry: &DomainEntry, permit: OwnedSemaphorePermit) -> ResultRow {
    let mut slot = Some(permit);
    let mut attempt = 1;

    loop {
        let fetch = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => FetchResult::cancelled(entry.clone()),
            fetch = fetch_attempt(ctx, entry) => fetch,
        };
        record_attempt(&ctx.stats, &fetch);

        let state = next_state(attempt, fetch.status, &ctx.policy, Instant::now());
        debug!(
            "{} attempt {attempt}: {} -> {state:?}",
            entry.hostname, fetch.status
        );

        match state {
            DomainState::Evaluating { attempt } => {
                return evaluate_page(ctx, entry, fetch, attempt).await;
            }
            DomainState::RetryWait { attempt: failed, due } => {
                ctx.stats.increment_info(InfoType::RetryScheduled);
                drop(slot.take());

                let woke = tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => false,
                    _ = tokio::time::sleep_until(due) => true,
                };
                if !woke {
                    ctx.stats.increment_error(ErrorType::Cancelled);
                    return cancelled_row(entry, failed).with_failure_reason(format!(
                        "cancelled while waiting to retry after {}",
                        fetch.status
                    ));
                }
                match ctx.acquire_slot().await {
                    Some(permit) => slot = Some(permit),
                    None => {
                        ctx.stats.increment_error(ErrorType::Cancelled);
                        return cancelled_row(entry, failed);
                    }
                }
                attempt = failed + 1;
            }
            DomainState::Failed {
                status,
                attempt,
                budget_exhausted,
            } => {
                let row = aggregate(entry, &fetch, None, None, None).with_attempts(attempt);
                if budget_exhausted {
                    ctx.stats.increment_error(ErrorType::RetryBudgetExhausted);
                    return row.with_failure_reason(format!(
                        "retry budget exhausted after {attempt} attempts: {status}"
                    ));
                }
                return row;
            }
        }
    }
}

/// One fetch, after waiting for the host's turn and a global token.
async fn fetch_attempt(ctx: &TaskContext, entry: &DomainEntry) -> FetchResult {
    ctx.host_limiter.wait_turn(&entry.hostname).await;
    if let Some(limiter) = &ctx.request_limiter {
        limiter.acquire().await;
    }
    ctx.fetcher.fetch(entry).await
}

fn record_attempt(stats: &ProcessingStats, fetch: &FetchResult) {
    update_error_stats(stats, fetch.status);
    if fetch.redirect_count() > 0 {
        stats.increment_info(InfoType::HttpRedirect);
    }
    if fetch.fell_back_to_http() {
        stats.increment_info(InfoType::HttpsToHttpFallback);
    }
}

/// Runs the evaluators on the blocking pool and aggregates the row.
///
/// A panicking evaluator yields a failure row for the domain.
async fn evaluate_page(
    ctx: &TaskContext,
    entry: &DomainEntry,
    fetch: FetchResult,
    attempts: u32,
) -> ResultRow {
    let pipeline = ctx.pipeline.clone();
    let content = fetch.raw_content.clone().unwrap_or_default();
    let headers = fetch.response_headers.clone();
    let final_url = fetch.final_url.clone();

    let joined = tokio::task::spawn_blocking(move || {
        pipeline.evaluate(&content, &headers, final_url.as_deref())
    })
    .await;

    let row = match joined {
        Ok(Evaluation {
            metrics,
            accessibility,
            threat,
        }) => {
            record_degradation(&ctx.stats, &fetch, &metrics);
            aggregate(entry, &fetch, Some(metrics), Some(accessibility), Some(threat))
        }
        Err(e) => {
            warn!("Evaluation of {} failed: {e}", entry.hostname);
            ctx.stats.increment_error(ErrorType::EvaluationPanic);
            aggregate(entry, &fetch, None, None, None)
                .with_failure_reason(format!("evaluator panicked: {e}"))
        }
    };
    row.with_attempts(attempts)
}

fn record_degradation(
    stats: &ProcessingStats,
    fetch: &FetchResult,
    metrics: &crate::metrics::MetricRecord,
) {
    if metrics.has_not_computable() {
        stats.increment_warning(WarningType::MetricNotComputable);
    }
    if metrics
        .get(MetricFeature::ParseErrorCount)
        .as_f64()
        .is_some_and(|count| count > 0.0)
    {
        stats.increment_warning(WarningType::MarkupParseErrors);
    }
    if fetch.body_truncated {
        stats.increment_warning(WarningType::BodyTruncated);
    }
}
