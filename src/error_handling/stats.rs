//! Processing statistics tracking.
//!
//! This module provides thread-safe counters for the errors, warnings, and
//! informational events observed while a sweep runs.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::{ErrorType, InfoType, WarningType};

/// Thread-safe processing statistics tracker.
///
/// Every category variant is registered with a zero counter on creation, so
/// increments never allocate and can be issued concurrently from all workers
/// through a shared `Arc<ProcessingStats>`.
///
/// # Categories
///
/// - **Errors**: fetch attempts that failed and rows that could not be completed
/// - **Warnings**: rows written with degraded data
/// - **Info**: notable events (redirects, scheme fallback, scheduled retries)
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    warnings: HashMap<WarningType, AtomicUsize>,
    info: HashMap<InfoType, AtomicUsize>,
}

fn zeroed<K: IntoEnumIterator + Eq + Hash>() -> HashMap<K, AtomicUsize> {
    K::iter().map(|k| (k, AtomicUsize::new(0))).collect()
}

fn bump<K: Eq + Hash + std::fmt::Debug>(map: &HashMap<K, AtomicUsize>, key: K) {
    if let Some(counter) = map.get(&key) {
        counter.fetch_add(1, Ordering::Relaxed);
    } else {
        // Unreachable when built through `new()`; log rather than crash a sweep
        log::error!("Counter for {key:?} missing from ProcessingStats");
    }
}

fn read<K: Eq + Hash>(map: &HashMap<K, AtomicUsize>, key: K) -> usize {
    map.get(&key).map(|c| c.load(Ordering::SeqCst)).unwrap_or(0)
}

impl ProcessingStats {
    pub fn new() -> Self {
        ProcessingStats {
            errors: zeroed(),
            warnings: zeroed(),
            info: zeroed(),
        }
    }

    pub fn increment_error(&self, error: ErrorType) {
        bump(&self.errors, error);
    }

    pub fn increment_warning(&self, warning: WarningType) {
        bump(&self.warnings, warning);
    }

    pub fn increment_info(&self, info_type: InfoType) {
        bump(&self.info, info_type);
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        read(&self.errors, error)
    }

    pub fn get_warning_count(&self, warning: WarningType) -> usize {
        read(&self.warnings, warning)
    }

    pub fn get_info_count(&self, info_type: InfoType) -> usize {
        read(&self.info, info_type)
    }

    /// Get total error count across all error types.
    pub fn total_errors(&self) -> usize {
        ErrorType::iter().map(|e| self.get_error_count(e)).sum()
    }

    /// Get total warning count across all warning types.
    pub fn total_warnings(&self) -> usize {
        WarningType::iter().map(|w| self.get_warning_count(w)).sum()
    }

    /// Get total info count across all info types.
    pub fn total_info(&self) -> usize {
        InfoType::iter().map(|i| self.get_info_count(i)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
