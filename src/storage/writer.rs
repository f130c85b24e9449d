// storage/writer.rs
// Single writer task feeding every dataset sink

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::aggregate::{ResultRow, RowOutcome};
use crate::config::SINK_CHANNEL_CAPACITY;
use crate::error_handling::{ErrorType, ProcessingStats, SinkError};

/// Destination for completed rows.
///
/// Only the writer task calls a sink, so implementations need not be
/// thread-safe beyond `Send`.
#[async_trait]
pub trait RowSink: Send {
    async fn write_row(&mut self, row: &ResultRow) -> Result<(), SinkError>;

    /// Called once after the last row.
    async fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// What the writer task did over a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterSummary {
    /// Distinct rows accepted (at most one per hostname).
    pub rows_written: usize,
    pub success: usize,
    pub partial: usize,
    pub failure: usize,
    pub duplicates_rejected: usize,
    /// Individual sink failures; a row that fails in one sink is still counted above.
    pub write_errors: usize,
}

impl WriterSummary {
    fn record(&mut self, outcome: RowOutcome) {
        self.rows_written += 1;
        match outcome {
            RowOutcome::Success => self.success += 1,
            RowOutcome::Partial => self.partial += 1,
            RowOutcome::Failure => self.failure += 1,
        }
    }
}

struct RowWriter {
    sinks: Vec<Box<dyn RowSink>>,
    seen: HashSet<String>,
    stats: Arc<ProcessingStats>,
    summary: WriterSummary,
}

impl RowWriter {
    async fn accept(&mut self, row: ResultRow) {
        if !self.seen.insert(row.hostname.clone()) {
            log::warn!("Rejected duplicate row for {}", row.hostname);
            self.stats.increment_error(ErrorType::DuplicateRowRejected);
            self.summary.duplicates_rejected += 1;
            return;
        }

        for sink in &mut self.sinks {
            if let Err(e) = sink.write_row(&row).await {
                log::error!("Failed to write row for {}: {}", row.hostname, e);
                self.stats.increment_error(ErrorType::SinkWriteError);
                self.summary.write_errors += 1;
            }
        }
        self.summary.record(row.outcome);
    }

    async fn finish(&mut self) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish().await {
                log::error!("Error finishing dataset sink: {}", e);
                self.stats.increment_error(ErrorType::SinkWriteError);
                self.summary.write_errors += 1;
            }
        }
    }
}

/// Starts the writer task.
///
/// Rows sent on the returned channel are written to every sink in arrival
/// order. A second row for a hostname already written is dropped. The task
/// ends when every sender is dropped and returns its summary.
pub fn spawn_writer(
    sinks: Vec<Box<dyn RowSink>>,
    stats: Arc<ProcessingStats>,
) -> (
    mpsc::Sender<ResultRow>,
    tokio::task::JoinHandle<WriterSummary>,
) {
    let (tx, mut rx) = mpsc::channel(SINK_CHANNEL_CAPACITY);
    let mut writer = RowWriter {
        sinks,
        seen: HashSet::new(),
        stats,
        summary: WriterSummary::default(),
    };

    let handle = tokio::spawn(async move {
        while let Some(row) = rx.recv().await {
            writer.accept(row).await;
        }
        log::debug!("Writer channel closed, finishing sinks");
        writer.finish().await;
        writer.summary
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::aggregate::aggregate;
    use crate::domain::{DomainEntry, TierBoundaries};
    use crate::fetch::{FetchResult, FetchStatus};

    #[derive(Clone, Default)]
    struct MemorySink {
        rows: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl RowSink for MemorySink {
        async fn write_row(&mut self, row: &ResultRow) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            self.rows.lock().expect("lock").push(row.hostname.clone());
            Ok(())
        }
    }

    fn row(rank: u64, host: &str) -> ResultRow {
        let entry = DomainEntry::new(rank, host, &TierBoundaries::default()).expect("valid host");
        let fetch = FetchResult::failed(entry.clone(), FetchStatus::ConnectFail, 1);
        aggregate(&entry, &fetch, None, None, None)
    }

    #[tokio::test]
    async fn test_writer_rejects_duplicate_hostnames() {
        let sink = MemorySink::default();
        let stats = Arc::new(ProcessingStats::new());
        let (tx, handle) = spawn_writer(vec![Box::new(sink.clone())], Arc::clone(&stats));

        tx.send(row(1, "a.example")).await.expect("send");
        tx.send(row(2, "b.example")).await.expect("send");
        tx.send(row(1, "a.example")).await.expect("send");
        drop(tx);
        let summary = handle.await.expect("writer task");

        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.failure, 2);
        assert_eq!(summary.duplicates_rejected, 1);
        assert_eq!(
            *sink.rows.lock().expect("lock"),
            vec!["a.example".to_string(), "b.example".to_string()]
        );
        assert_eq!(stats.get_error_count(ErrorType::DuplicateRowRejected), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let good = MemorySink::default();
        let bad = MemorySink {
            fail: true,
            ..Default::default()
        };
        let stats = Arc::new(ProcessingStats::new());
        let (tx, handle) = spawn_writer(
            vec![Box::new(bad), Box::new(good.clone())],
            Arc::clone(&stats),
        );

        tx.send(row(1, "a.example")).await.expect("send");
        drop(tx);
        let summary = handle.await.expect("writer task");

        assert_eq!(summary.write_errors, 1);
        assert_eq!(good.rows.lock().expect("lock").len(), 1);
        assert_eq!(stats.get_error_count(ErrorType::SinkWriteError), 1);
    }
}
