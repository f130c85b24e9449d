//! Merges a fetch and the evaluator records into one dataset row.
//!
//! Evaluator records are all-or-nothing: a row either carries metrics,
//! accessibility and threat records together, or none of them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::accessibility::AccessibilityRecord;
use crate::domain::{DomainEntry, PopularityTier};
use crate::fetch::{FetchResult, FetchStatus};
use crate::metrics::{MetricFeature, MetricRecord};
use crate::threat::ThreatRecord;
use crate::utils::sanitize::sanitize_and_truncate_error_message;

/// Overall quality of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOutcome {
    /// All records present, every metric computable, markup parsed cleanly.
    Success,
    /// All records present, but some metric is `NA` or the markup had errors.
    Partial,
    /// No evaluator records.
    Failure,
}

impl RowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOutcome::Success => "success",
            RowOutcome::Partial => "partial",
            RowOutcome::Failure => "failure",
        }
    }
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset row: everything recorded about one domain in one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub rank: u64,
    pub hostname: String,
    pub tier: PopularityTier,
    pub fetch_status: FetchStatus,
    pub outcome: RowOutcome,
    /// Fetch attempts made, including the last one.
    pub attempts: u32,
    pub final_url: Option<String>,
    pub elapsed_ms: u64,
    pub metrics: Option<MetricRecord>,
    pub accessibility: Option<AccessibilityRecord>,
    pub threat: Option<ThreatRecord>,
    pub timestamp: DateTime<Utc>,
    pub failure_reason: Option<String>,
}

impl ResultRow {
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Replaces the failure reason of a failed row; no effect on other rows.
    ///
    /// The reason is stripped of control characters and length-capped.
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        if self.outcome == RowOutcome::Failure {
            self.failure_reason = Some(sanitize_and_truncate_error_message(&reason.into()));
        }
        self
    }

    pub fn has_evaluations(&self) -> bool {
        self.metrics.is_some() && self.accessibility.is_some() && self.threat.is_some()
    }
}

fn missing_records(
    metrics: &Option<MetricRecord>,
    accessibility: &Option<AccessibilityRecord>,
    threat: &Option<ThreatRecord>,
) -> Vec<&'static str> {
    [
        ("metrics", metrics.is_none()),
        ("accessibility", accessibility.is_none()),
        ("threat", threat.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect()
}

/// Builds the row for `domain` from its fetch and evaluator records.
///
/// Deterministic: the timestamp comes from the fetch, so equal inputs give
/// equal rows. `attempts` defaults to 1; the orchestrator overrides it.
pub fn aggregate(
    domain: &DomainEntry,
    fetch: &FetchResult,
    metrics: Option<MetricRecord>,
    accessibility: Option<AccessibilityRecord>,
    threat: Option<ThreatRecord>,
) -> ResultRow {
    let mut row = ResultRow {
        rank: domain.rank,
        hostname: domain.hostname.clone(),
        tier: domain.tier,
        fetch_status: fetch.status,
        outcome: RowOutcome::Failure,
        attempts: 1,
        final_url: fetch.final_url.clone(),
        elapsed_ms: fetch.elapsed_ms,
        metrics: None,
        accessibility: None,
        threat: None,
        timestamp: fetch.fetched_at,
        failure_reason: None,
    };

    if !fetch.status.is_ok() {
        row.failure_reason = Some(fetch.status.to_string());
        return row;
    }

    let missing = missing_records(&metrics, &accessibility, &threat);
    let (Some(metrics), Some(accessibility), Some(threat)) = (metrics, accessibility, threat)
    else {
        row.failure_reason = Some(format!("missing evaluator output: {}", missing.join(", ")));
        return row;
    };

    let parse_errors = metrics
        .get(MetricFeature::ParseErrorCount)
        .as_f64()
        .is_some_and(|count| count > 0.0);
    row.outcome = if metrics.has_not_computable() || parse_errors {
        RowOutcome::Partial
    } else {
        RowOutcome::Success
    };
    row.metrics = Some(metrics);
    row.accessibility = Some(accessibility);
    row.threat = Some(threat);
    row
}
