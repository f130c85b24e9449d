// Shared test helpers: a scripted fetcher and an in-memory row sink.
//
// Included by the integration test files with `mod helpers;`.

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use water::domain::{DomainEntry, TierBoundaries};
use water::error_handling::SinkError;
use water::run::RetryPolicy;
use water::storage::RowSink;
use water::{FetchResult, FetchStatus, PageFetcher, ResultRow, SweepSettings};

/// A well-formed page with every metric computable.
pub const CLEAN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Clean</title></head>
<body>
<main>
<h1>Welcome</h1>
<p style="color: #000000; background-color: #ffffff">Readable text</p>
<img src="logo.png" alt="Company logo">
<a href="/about">About us</a>
<form><label for="q">Search</label><input id="q" type="text"></form>
</main>
</body>
</html>"#;

/// What the scripted fetcher answers for one attempt.
#[derive(Debug, Clone)]
pub enum Reply {
    Page(String),
    Status(FetchStatus),
    /// Never answers; only cancellation ends the attempt.
    Hang,
}

/// Fetcher answering from a per-host script and recording attempt start times.
///
/// The last reply of a script repeats once the script runs out. Hosts without a
/// script answer with `CLEAN_PAGE`.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, host: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .expect("lock")
            .insert(host.to_string(), replies.into());
        self
    }

    pub fn calls(&self, host: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .expect("lock")
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    fn next_reply(&self, host: &str) -> Reply {
        let mut scripts = self.scripts.lock().expect("lock");
        match scripts.get_mut(host) {
            Some(script) if script.len() > 1 => script.pop_front().expect("non-empty script"),
            Some(script) => script
                .front()
                .cloned()
                .unwrap_or_else(|| Reply::Page(CLEAN_PAGE.to_string())),
            None => Reply::Page(CLEAN_PAGE.to_string()),
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, domain: &DomainEntry) -> FetchResult {
        self.calls
            .lock()
            .expect("lock")
            .entry(domain.hostname.clone())
            .or_default()
            .push(Instant::now());

        match self.next_reply(&domain.hostname) {
            Reply::Page(html) => {
                let mut result = FetchResult::failed(domain.clone(), FetchStatus::Ok, 5);
                result.raw_content = Some(html.into_bytes());
                result.final_url = Some(domain.root_url("https"));
                result.response_headers = BTreeMap::from([(
                    "content-type".to_string(),
                    "text/html".to_string(),
                )]);
                result
            }
            Reply::Status(status) => FetchResult::failed(domain.clone(), status, 5),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                FetchResult::failed(domain.clone(), FetchStatus::Timeout, 0)
            }
        }
    }
}

/// Sink keeping rows in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub rows: Arc<Mutex<Vec<ResultRow>>>,
}

impl MemorySink {
    pub fn rows(&self) -> Vec<ResultRow> {
        self.rows.lock().expect("lock").clone()
    }

    pub fn row(&self, host: &str) -> ResultRow {
        self.rows()
            .into_iter()
            .find(|r| r.hostname == host)
            .unwrap_or_else(|| panic!("no row for {host}"))
    }
}

#[async_trait]
impl RowSink for MemorySink {
    async fn write_row(&mut self, row: &ResultRow) -> Result<(), SinkError> {
        self.rows.lock().expect("lock").push(row.clone());
        Ok(())
    }
}

/// Entries `site1.example` .. `siteN.example` with ranks 1..=N.
pub fn entries(count: u64) -> Vec<DomainEntry> {
    (1..=count)
        .map(|rank| {
            DomainEntry::new(rank, &format!("site{rank}.example"), &TierBoundaries::default())
                .expect("valid host")
        })
        .collect()
}

/// Settings with no host spacing and a short backoff, for fast sweeps.
pub fn fast_settings(workers: usize) -> SweepSettings {
    SweepSettings {
        workers,
        host_interval: Duration::ZERO,
        rate_limit_rps: 0,
        retry: RetryPolicy {
            budget: 3,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(1),
        },
        sweep_timeout: None,
    }
}
