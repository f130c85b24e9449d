//! water library: web accessibility and threat evaluation at scale
//!
//! This library sweeps a ranked list of websites and records, for every
//! domain, one dataset row with base accessibility metrics, a WCAG 2.1
//! compliance estimate, and phishing and information-leakage indicators.
//!
//! # Example
//!
//! ```no_run
//! use water::{Config, run_sweep};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("top-sites.csv"),
//!     workers: 50,
//!     ..Default::default()
//! };
//!
//! let report = run_sweep(config).await?;
//! println!("{} domains: {} success, {} partial, {} failure",
//!          report.total_domains, report.success, report.partial, report.failure);
//! # Ok(())
//! # }
//! ```
//!
//! The evaluators are also usable on their own:
//!
//! ```
//! let page = br#"<html lang="en"><title>Home</title><img src="logo.png"></html>"#;
//! let metrics = water::metrics::extract(page);
//! let wcag = water::accessibility::evaluate(page);
//! assert!(wcag.compliance_percent < 100.0);
//! # let _ = metrics;
//! ```
//!
//! # Requirements
//!
//! Sweeping requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod accessibility;
pub mod aggregate;
mod app;
pub mod config;
pub mod domain;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod metrics;
pub mod parse;
pub mod run;
pub mod storage;
pub mod threat;
mod utils;

// Re-export public API
pub use aggregate::{aggregate, ResultRow, RowOutcome};
pub use config::{Config, LogFormat, LogLevel};
pub use domain::{DomainEntry, PopularityTier};
pub use fetch::{FetchResult, FetchStatus, PageFetcher};
pub use run::{run_sweep, run_sweep_with_cancel, Sweep, SweepReport, SweepSettings};
