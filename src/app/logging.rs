//! Progress logging utilities.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::info;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::LOGGING_INTERVAL;
use crate::run::SweepProgress;

/// Logs how many domains have finished so far.
///
/// # Arguments
///
/// * `start_time` - The start time of the sweep
/// * `progress` - Counters shared with the domain tasks
pub fn log_progress(start_time: Instant, progress: &SweepProgress) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let completed = progress.completed.load(Ordering::SeqCst);
    let failed = progress.failed.load(Ordering::SeqCst);
    let total = progress.total.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {completed}/{total} domains ({failed} failed) in {elapsed_secs:.2} seconds (~{rate:.2} domains/sec)"
    );
}

/// Spawns the task that logs progress every `LOGGING_INTERVAL` until `cancel` fires.
pub fn spawn_progress_logger(
    start_time: Instant,
    progress: Arc<SweepProgress>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LOGGING_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => log_progress(start_time, &progress),
                _ = cancel.cancelled() => break,
            }
        }
    })
}
