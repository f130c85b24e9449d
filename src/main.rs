//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `water` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C cancellation
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use water::initialization::{init_crypto_provider, init_logger_with};
use water::{run_sweep_with_cancel, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    // First Ctrl-C cancels the sweep; rows already written stay valid
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, cancelling sweep");
            ctrl_c_cancel.cancel();
        }
    });

    match run_sweep_with_cancel(config, cancel).await {
        Ok(report) => {
            println!(
                "✅ Wrote {} row{} for {} domain{} ({} success, {} partial, {} failure) in {:.1}s",
                report.rows_written,
                if report.rows_written == 1 { "" } else { "s" },
                report.total_domains,
                if report.total_domains == 1 { "" } else { "s" },
                report.success,
                report.partial,
                report.failure,
                report.elapsed_seconds
            );
            println!("Results appended to {}", report.output.display());
            if let Some(db_path) = &report.db_path {
                println!("Run {} mirrored in {}", report.run_id, db_path.display());
            }
            if report.cancelled {
                println!("Sweep was cancelled; unfinished domains are recorded as CANCELLED");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("water error: {:#}", e);
            process::exit(1);
        }
    }
}
