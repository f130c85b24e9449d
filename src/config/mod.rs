//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, versions)
//! - HTTP header name constants
//! - The `Config` struct, parsed from the command line or built in code

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{Config, LogFormat, LogLevel};
