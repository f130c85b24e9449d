//! Per-host request spacing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Keeps consecutive request starts against one host at least `interval` apart.
///
/// Each host has its own async lock holding the time of its last request
/// start; waiting for one host never blocks another.
#[derive(Debug)]
pub struct HostRateLimiter {
    interval: Duration,
    hosts: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<Instant>>>>>,
}

impl HostRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until `host` may be contacted again and records the start.
    pub async fn wait_turn(&self, host: &str) {
        let slot = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(hosts.entry(host.to_string()).or_default())
        };

        let mut last_start = slot.lock().await;
        if let Some(previous) = *last_start {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last_start = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_same_host_is_spaced() {
        let limiter = Arc::new(HostRateLimiter::new(Duration::from_secs(1)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.wait_turn("example.com").await;
                Instant::now()
            }));
        }
        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.expect("task"));
        }
        starts.sort();

        assert!(starts[0] - start < Duration::from_millis(1));
        assert!(starts[1] - starts[0] >= Duration::from_secs(1));
        assert!(starts[2] - starts[1] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_hosts_are_independent() {
        let limiter = HostRateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();

        limiter.wait_turn("a.example").await;
        limiter.wait_turn("b.example").await;

        assert!(Instant::now() - start < Duration::from_millis(1));
    }
}
