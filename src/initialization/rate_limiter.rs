//! Rate limiter initialization.
//!
//! This module provides the optional global token-bucket limiter that caps the
//! sweep's request rate across all hosts.

use std::sync::Arc;
use tokio::sync::Semaphore as TokioSemaphore;
use tokio::time::{interval, Duration as TokioDuration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Token-bucket rate limiter for controlling the global request rate.
///
/// Tokens are replenished at a fixed rate (requests per second) by a background
/// task, up to the burst capacity. Each request start consumes one token and
/// waits while the bucket is empty.
pub struct RateLimiter {
    permits: Arc<TokioSemaphore>,
    rps: u32,
    capacity: usize,
}

impl RateLimiter {
    /// Waits for and consumes one token.
    pub async fn acquire(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            // Tokens are spent, not returned
            permit.forget();
        }
    }

    pub fn rps(&self) -> u32 {
        self.rps
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Initializes a token-bucket rate limiter.
///
/// If `rps` is 0, rate limiting is disabled and `None` is returned.
///
/// # Arguments
///
/// * `rps` - Requests per second (0 disables rate limiting)
/// * `burst` - Burst capacity (maximum tokens in bucket, at least 1)
///
/// # Returns
///
/// The limiter and the cancellation token that stops its replenishment task.
pub fn init_rate_limiter(rps: u32, burst: usize) -> Option<(Arc<RateLimiter>, CancellationToken)> {
    if rps == 0 {
        return None;
    }
    let capacity = burst.max(1);
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    let limiter = Arc::new(RateLimiter {
        permits: Arc::new(TokioSemaphore::new(capacity)),
        rps,
        capacity,
    });

    let permits = Arc::clone(&limiter.permits);
    // Fast ticker; fractional tokens carry over between ticks
    let mut ticker = interval(TokioDuration::from_millis(100));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::spawn(async move {
        let mut last_time = tokio::time::Instant::now();
        let mut fractional = 0.0f64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = tokio::time::Instant::now();
                    let earned = f64::from(rps) * now.duration_since(last_time).as_secs_f64() + fractional;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole = earned.floor() as usize;
                    #[allow(clippy::cast_precision_loss)]
                    {
                        fractional = earned - whole as f64;
                    }
                    let room = capacity.saturating_sub(permits.available_permits());
                    let to_add = whole.min(room);
                    if to_add > 0 {
                        permits.add_permits(to_add);
                    }
                    if to_add < whole {
                        // Bucket full; overflow is discarded
                        fractional = 0.0;
                    }
                    last_time = now;
                }
                _ = shutdown_clone.cancelled() => {
                    log::debug!("Rate limiter background task shutting down");
                    break;
                }
            }
        }
    });

    Some((limiter, shutdown))
}
