//! Sweep reporting helpers.
//!
//! Progress logging while the sweep runs, statistics printing at the end, and
//! shutdown of the background tasks.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::{log_progress, spawn_progress_logger};
pub use shutdown::shutdown_gracefully;
pub use statistics::{print_error_statistics, print_summary};
