//! Per-domain state machine.
//!
//! `next_state` is pure: given the attempt number and the status of the fetch
//! that just finished, it decides whether the domain moves on to evaluation,
//! waits for a retry, or fails. The task in `task.rs` drives it.

use std::time::Duration;

use tokio::time::Instant;

use crate::error_handling::get_retry_strategy;
use crate::fetch::FetchStatus;

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fetch attempts per domain, first attempt included.
    pub budget: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: crate::config::DEFAULT_RETRY_BUDGET,
            backoff_base: Duration::from_millis(crate::config::DEFAULT_BACKOFF_BASE_MS),
            backoff_max: Duration::from_millis(crate::config::DEFAULT_BACKOFF_MAX_MS),
        }
    }
}

impl RetryPolicy {
    /// Delays before the second, third, ... attempt. Non-decreasing and capped
    /// at `backoff_max`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        get_retry_strategy(self.backoff_base, self.backoff_max)
            .take(self.budget.saturating_sub(1) as usize)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based), if
    /// another attempt is allowed.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        let index = attempt.checked_sub(1)? as usize;
        self.delays().nth(index)
    }
}

/// State a domain enters after a fetch attempt.
///
/// The other states are positions in the task itself: a domain is pending
/// while it waits for a worker slot, fetching while the fetcher runs, and done
/// once its row is on the sink channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    Evaluating { attempt: u32 },
    /// Worker slot released until `due`.
    RetryWait { attempt: u32, due: Instant },
    Failed {
        status: FetchStatus,
        attempt: u32,
        budget_exhausted: bool,
    },
}

/// Transition taken when fetch attempt `attempt` finished with `status`.
pub fn next_state(
    attempt: u32,
    status: FetchStatus,
    policy: &RetryPolicy,
    now: Instant,
) -> DomainState {
    if status.is_ok() {
        return DomainState::Evaluating { attempt };
    }
    if !status.is_transient() {
        return DomainState::Failed {
            status,
            attempt,
            budget_exhausted: false,
        };
    }
    match policy.delay_after(attempt) {
        Some(delay) => DomainState::RetryWait {
            attempt,
            due: now + delay,
        },
        None => DomainState::Failed {
            status,
            attempt,
            budget_exhausted: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(budget: u32) -> RetryPolicy {
        RetryPolicy {
            budget,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_delays_double_and_cap() {
        let delays: Vec<_> = RetryPolicy {
            budget: 8,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(10),
        }
        .delays()
        .collect();

        assert_eq!(delays.len(), 7);
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[1], Duration::from_secs(2));
        assert_eq!(delays[2], Duration::from_secs(4));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert!(delays[4..].iter().all(|d| *d == Duration::from_secs(10)));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_budget_of_one_never_retries() {
        assert_eq!(policy(1).delays().count(), 0);
        assert_eq!(policy(1).delay_after(1), None);
    }

    #[test]
    fn test_ok_goes_to_evaluation() {
        let now = Instant::now();
        assert_eq!(
            next_state(2, FetchStatus::Ok, &policy(3), now),
            DomainState::Evaluating { attempt: 2 }
        );
    }

    #[test]
    fn test_transient_failure_waits_then_exhausts() {
        let now = Instant::now();
        let p = policy(3);

        assert_eq!(
            next_state(1, FetchStatus::Timeout, &p, now),
            DomainState::RetryWait {
                attempt: 1,
                due: now + Duration::from_secs(1)
            }
        );
        assert_eq!(
            next_state(2, FetchStatus::HttpError(503), &p, now),
            DomainState::RetryWait {
                attempt: 2,
                due: now + Duration::from_secs(2)
            }
        );
        assert_eq!(
            next_state(3, FetchStatus::ConnectFail, &p, now),
            DomainState::Failed {
                status: FetchStatus::ConnectFail,
                attempt: 3,
                budget_exhausted: true
            }
        );
    }

    #[test]
    fn test_permanent_failures_do_not_retry() {
        let now = Instant::now();
        for status in [
            FetchStatus::DnsFail,
            FetchStatus::TlsFail,
            FetchStatus::RedirectLoop,
            FetchStatus::HttpError(404),
            FetchStatus::Cancelled,
        ] {
            assert_eq!(
                next_state(1, status, &policy(3), now),
                DomainState::Failed {
                    status,
                    attempt: 1,
                    budget_exhausted: false
                }
            );
        }
    }

    #[test]
    fn test_rate_limited_is_retried() {
        let now = Instant::now();
        assert!(matches!(
            next_state(1, FetchStatus::HttpError(429), &policy(3), now),
            DomainState::RetryWait { .. }
        ));
    }
}
