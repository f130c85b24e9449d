//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a sweep:
//! - Logger
//! - HTTP client (redirects disabled, timeouts from config)
//! - DNS resolver
//! - Global token-bucket rate limiter
//! - Worker-pool semaphore and TLS crypto provider

mod client;
mod logger;
mod rate_limiter;
mod resolver;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use rate_limiter::{init_rate_limiter, RateLimiter};
pub use resolver::init_resolver;

/// Initializes the worker-pool semaphore.
///
/// Tokio's semaphore is fair, so waiting domains are admitted in FIFO order.
///
/// # Arguments
///
/// * `count` - Maximum number of domains in the FETCHING or EVALUATING state at once
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Initializes the crypto provider for TLS operations.
///
/// Installs the `ring` provider as the process default for `rustls`. Must run
/// before the first TLS connection.
pub fn init_crypto_provider() {
    // Reinstalling the provider fails harmlessly
    let _ = CryptoProvider::install_default(default_provider());
}
