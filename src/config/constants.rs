//! Configuration constants.
//!
//! This module defines the defaults for every run parameter and the hard limits
//! applied while fetching and evaluating pages.

use std::time::Duration;

/// Default worker-pool size (domains processed concurrently)
pub const DEFAULT_WORKERS: usize = 32;
/// Interval between progress log lines
pub const LOGGING_INTERVAL: Duration = Duration::from_secs(5);
/// Default output dataset path
pub const DEFAULT_OUTPUT_PATH: &str = "./water_results.csv";

// Network operation timeouts
/// DNS query timeout in seconds
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// TCP connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Budget for one whole fetch (every scheme and redirect hop) in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default User-Agent string for HTTP requests.
///
/// Identifies the sweep honestly; users can override it via `--user-agent`.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; water/0.1; +https://www.w3.org/WAI/standards-guidelines/wcag/)";

// Response limits
/// Maximum response body size kept for evaluation (2 MiB); larger bodies are truncated
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Maximum number of response headers retained per page
pub const MAX_HEADER_COUNT: usize = 100;
/// Maximum length of a retained header value, in characters
pub const MAX_HEADER_VALUE_LENGTH: usize = 1000;
/// Maximum failure-reason length stored in the dataset
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

// Redirect handling
/// Maximum redirect hops followed before a fetch is classified as a loop
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

// Retry strategy
/// Total fetch attempts per domain (first attempt included)
pub const DEFAULT_RETRY_BUDGET: u32 = 3;
/// First retry delay in milliseconds; later delays double
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
/// Upper bound for a single retry delay in milliseconds
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

// Politeness
/// Minimum spacing between two request starts against the same host, in milliseconds
pub const DEFAULT_HOST_INTERVAL_MS: u64 = 1000;
/// Burst capacity of the optional global token bucket, as a multiple of its rate
pub const RATE_LIMIT_BURST_FACTOR: u32 = 2;

// Popularity tiers
/// Highest rank (inclusive) classified as the Top tier
pub const DEFAULT_TOP_TIER_MAX_RANK: u64 = 1_000;
/// Highest rank (inclusive) classified as the Mid tier; anything above is Low
pub const DEFAULT_MID_TIER_MAX_RANK: u64 = 10_000;

// HTTP status codes
/// 429 Too Many Requests
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Capacity of the channel feeding the single dataset writer
pub const SINK_CHANNEL_CAPACITY: usize = 256;

// Versions recorded alongside every row
/// Version of the base metric feature set
pub const METRIC_SET_VERSION: &str = "1";
/// Version of the default WCAG 2.1 rule set
pub const WCAG21_RULESET_VERSION: &str = "wcag21-1";
/// Version of the threat indicator weights
pub const THREAT_WEIGHTS_VERSION: &str = "1";
