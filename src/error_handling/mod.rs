//! Error handling and processing statistics.
//!
//! This module provides:
//! - Setup error types (`InitializationError`, `DatabaseError`, `InputError`, `ConfigError`)
//! - Fetch error categorization and the retry backoff schedule
//! - Processing statistics tracking (errors, warnings, info events)
//!
//! Only setup errors abort a sweep. Everything that goes wrong for a single
//! domain is captured in that domain's row and counted here.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_fetch_error, error_type_for_status, get_retry_strategy, update_error_stats,
};
pub use stats::ProcessingStats;
pub use types::{
    ConfigError, DatabaseError, ErrorType, InfoType, InitializationError, InputError, SinkError,
    WarningType,
};
