//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};
use crate::storage::WriterSummary;

/// Prints a one-line summary of the sweep.
///
/// Works with both plain and JSON log formats (log::info! handles formatting).
pub fn print_summary(summary: &WriterSummary, cancelled: bool, elapsed_seconds: f64) {
    let rows = summary.rows_written;
    let marker = if cancelled { "⚠️" } else { "✅" };
    info!(
        "{marker} Wrote {rows} row{} ({} success, {} partial, {} failure) in {elapsed_seconds:.1}s{}",
        if rows == 1 { "" } else { "s" },
        summary.success,
        summary.partial,
        summary.failure,
        if cancelled { " - sweep was cancelled" } else { "" }
    );
    if summary.duplicates_rejected > 0 || summary.write_errors > 0 {
        info!(
            "   {} duplicate row(s) rejected, {} sink write error(s)",
            summary.duplicates_rejected, summary.write_errors
        );
    }
}

/// Prints error, warning, and info statistics to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_warnings = error_stats.total_warnings();
    let total_info = error_stats.total_info();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_warnings > 0 {
        info!("Warning Counts ({} total):", total_warnings);
        for warning_type in WarningType::iter() {
            let count = error_stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = error_stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_statistics_no_errors() {
        let stats = ProcessingStats::new();
        // Should not panic when there are no errors
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_error_statistics_all_types() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::FetchTimeout);
        stats.increment_error(ErrorType::RetryBudgetExhausted);
        stats.increment_warning(WarningType::MetricNotComputable);
        stats.increment_info(InfoType::RetryScheduled);
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_summary_cancelled() {
        let summary = WriterSummary {
            rows_written: 3,
            success: 1,
            partial: 1,
            failure: 1,
            duplicates_rejected: 1,
            write_errors: 0,
        };
        print_summary(&summary, true, 2.5);
        print_summary(&WriterSummary::default(), false, 0.0);
    }
}
