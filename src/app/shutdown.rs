//! Graceful shutdown handling.

use tokio_util::sync::CancellationToken;

/// Shuts down the sweep's background tasks.
///
/// Stops the progress logger and waits for it, then stops the global rate
/// limiter's replenishment task if there is one. Rows are flushed by the
/// writer task before this runs.
pub async fn shutdown_gracefully(
    cancel: CancellationToken,
    logging_task: Option<tokio::task::JoinHandle<()>>,
    rate_limiter_shutdown: Option<CancellationToken>,
) {
    cancel.cancel();
    if let Some(logging_task) = logging_task {
        let _ = logging_task.await;
    }

    if let Some(shutdown) = rate_limiter_shutdown {
        shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_stops_logger_and_limiter() {
        let cancel = CancellationToken::new();
        let limiter = CancellationToken::new();
        let logger_cancel = cancel.clone();
        let task = tokio::spawn(async move { logger_cancel.cancelled().await });

        shutdown_gracefully(cancel.clone(), Some(task), Some(limiter.clone())).await;

        assert!(cancel.is_cancelled());
        assert!(limiter.is_cancelled());
    }
}
