//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::constants::*;
use crate::domain::TierBoundaries;
use crate::error_handling::ConfigError;
use crate::run::RetryPolicy;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: One JSON object per line for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Sweep configuration.
///
/// Parsed from the command line by the binary (`Config::parse()`), or built in
/// code starting from `Config::default()`.
///
/// # Examples
///
/// ```no_run
/// use water::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("top-sites.csv"),
///     workers: 64,
///     rate_limit_rps: 20,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "water",
    version,
    about = "Measures accessibility metrics, WCAG 2.1 compliance and threat indicators across a ranked list of websites"
)]
pub struct Config {
    /// Ranked domain list, one `rank, hostname` pair per line
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output dataset (CSV); rows are appended when the file already exists
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Optional SQLite database mirroring the dataset
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Number of domains processed concurrently
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Minimum spacing between request starts against one host, in milliseconds
    #[arg(long, default_value_t = DEFAULT_HOST_INTERVAL_MS)]
    pub host_interval_ms: u64,

    /// Global requests per second across all hosts (0 disables the limit)
    #[arg(long, default_value_t = 0)]
    pub rate_limit_rps: u32,

    /// Fetch attempts per domain, first attempt included
    #[arg(long, default_value_t = DEFAULT_RETRY_BUDGET)]
    pub retry_budget: u32,

    /// First retry delay in milliseconds (doubles on every retry)
    #[arg(long, default_value_t = DEFAULT_BACKOFF_BASE_MS)]
    pub backoff_base_ms: u64,

    /// Upper bound for one retry delay in milliseconds
    #[arg(long, default_value_t = DEFAULT_BACKOFF_MAX_MS)]
    pub backoff_max_ms: u64,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Total timeout for one fetch (all redirect hops), in seconds
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Maximum redirect hops before a fetch is classified as a loop
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    pub max_redirects: usize,

    /// Cancel the sweep after this many seconds; unfinished domains are recorded as CANCELLED
    #[arg(long)]
    pub sweep_timeout_secs: Option<u64>,

    /// Fetch over plain HTTP only instead of trying HTTPS first
    #[arg(long = "no-https-first", action = ArgAction::SetFalse)]
    pub https_first: bool,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Highest rank (inclusive) in the Top popularity tier
    #[arg(long, default_value_t = DEFAULT_TOP_TIER_MAX_RANK)]
    pub top_tier_max_rank: u64,

    /// Highest rank (inclusive) in the Mid popularity tier
    #[arg(long, default_value_t = DEFAULT_MID_TIER_MAX_RANK)]
    pub mid_tier_max_rank: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("domains.csv"),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            db_path: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            workers: DEFAULT_WORKERS,
            host_interval_ms: DEFAULT_HOST_INTERVAL_MS,
            rate_limit_rps: 0,
            retry_budget: DEFAULT_RETRY_BUDGET,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            sweep_timeout_secs: None,
            https_first: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            top_tier_max_rank: DEFAULT_TOP_TIER_MAX_RANK,
            mid_tier_max_rank: DEFAULT_MID_TIER_MAX_RANK,
        }
    }
}

impl Config {
    /// Checks the parameters that would make a sweep meaningless or stall it.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.retry_budget == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        if self.timeout_seconds == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.backoff_base_ms == 0 || self.backoff_max_ms < self.backoff_base_ms {
            return Err(ConfigError::InvalidBackoff {
                base_ms: self.backoff_base_ms,
                max_ms: self.backoff_max_ms,
            });
        }
        if self.top_tier_max_rank == 0 || self.mid_tier_max_rank < self.top_tier_max_rank {
            return Err(ConfigError::InvalidTierBoundaries {
                top: self.top_tier_max_rank,
                mid: self.mid_tier_max_rank,
            });
        }
        Ok(())
    }

    pub fn tier_boundaries(&self) -> TierBoundaries {
        TierBoundaries {
            top_max_rank: self.top_tier_max_rank,
            mid_max_rank: self.mid_tier_max_rank,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            budget: self.retry_budget,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
        }
    }

    pub fn host_interval(&self) -> Duration {
        Duration::from_millis(self.host_interval_ms)
    }

    pub fn sweep_timeout(&self) -> Option<Duration> {
        self.sweep_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.workers, 32);
        assert_eq!(config.host_interval_ms, 1000);
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.backoff_base_ms, 1000);
        assert_eq!(config.backoff_max_ms, 30_000);
        assert_eq!(config.max_redirects, 5);
        assert!(config.https_first);
        assert!(config.db_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_defaults() {
        let config = Config::parse_from(["water", "sites.csv"]);
        assert_eq!(config.file, PathBuf::from("sites.csv"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert!(config.https_first);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert!(config.sweep_timeout_secs.is_none());
    }

    #[test]
    fn test_cli_parsing_overrides() {
        let config = Config::parse_from([
            "water",
            "sites.csv",
            "--no-https-first",
            "--workers",
            "4",
            "--timeout",
            "7",
            "--db-path",
            "water.db",
            "--log-format",
            "json",
        ]);
        assert!(!config.https_first);
        assert_eq!(config.workers, 4);
        assert_eq!(config.timeout_seconds, 7);
        assert_eq!(config.db_path, Some(PathBuf::from("water.db")));
        assert!(matches!(config.log_format, LogFormat::Json));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = Config {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWorkers)));
    }

    #[test]
    fn test_validate_rejects_inverted_tiers() {
        let config = Config {
            top_tier_max_rank: 5_000,
            mid_tier_max_rank: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTierBoundaries { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_backoff_max_below_base() {
        let config = Config {
            backoff_base_ms: 2_000,
            backoff_max_ms: 1_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBackoff { .. })
        ));
    }

    #[test]
    fn test_odd_backoff_base_is_kept_exactly() {
        let config = Config {
            backoff_base_ms: 1_001,
            backoff_max_ms: 10_000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let delays: Vec<_> = config.retry_policy().delays().collect();
        assert_eq!(
            delays,
            vec![Duration::from_millis(1_001), Duration::from_millis(2_002)]
        );

        let zero = Config {
            backoff_base_ms: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidBackoff { .. })));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.budget, 3);
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
        assert_eq!(policy.backoff_max, Duration::from_secs(30));
    }
}
