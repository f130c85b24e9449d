//! Flat dataset layout shared by the CSV file and the SQLite mirror.
//!
//! Column order is fixed: row identity and fetch outcome first, then one
//! column per metric feature, the accessibility summary and one column per
//! rule, then the threat summary and one 0/1 flag per indicator. Missing
//! evaluator records leave their cells empty.

use chrono::SecondsFormat;
use strum::IntoEnumIterator;

use crate::accessibility::default_rules;
use crate::aggregate::ResultRow;
use crate::metrics::MetricFeature;
use crate::threat::ThreatIndicator;

const LEADING_COLUMNS: &[&str] = &[
    "rank",
    "hostname",
    "tier",
    "fetch_status",
    "http_status",
    "outcome",
    "attempts",
    "final_url",
    "elapsed_ms",
    "timestamp",
    "failure_reason",
];

/// Column name for a rule id (`image-alt` becomes `rule_image_alt`).
pub fn rule_column(rule_id: &str) -> String {
    format!("rule_{}", rule_id.replace('-', "_"))
}

/// Column name for a threat indicator.
pub fn threat_column(indicator: ThreatIndicator) -> String {
    format!("threat_{}", indicator.code())
}

/// Header row of the dataset.
pub fn dataset_columns() -> Vec<String> {
    let mut columns: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(MetricFeature::iter().map(|feature| feature.as_str().to_string()));
    columns.push("metric_set_version".to_string());
    columns.push("compliance_percent".to_string());
    columns.push("ruleset_version".to_string());
    columns.extend(default_rules().iter().map(|rule| rule_column(rule.id)));
    columns.push("risk_score".to_string());
    columns.push("tracker_count".to_string());
    columns.push("weights_version".to_string());
    columns.extend(ThreatIndicator::iter().map(threat_column));
    columns
}

fn empty_cells(count: usize) -> impl Iterator<Item = String> {
    std::iter::repeat(String::new()).take(count)
}

/// One dataset record, aligned with [`dataset_columns`].
pub fn flatten_row(row: &ResultRow) -> Vec<String> {
    let mut record = vec![
        row.rank.to_string(),
        row.hostname.clone(),
        row.tier.to_string(),
        row.fetch_status.code().to_string(),
        row.fetch_status
            .http_status()
            .map(|code| code.to_string())
            .unwrap_or_default(),
        row.outcome.to_string(),
        row.attempts.to_string(),
        row.final_url.clone().unwrap_or_default(),
        row.elapsed_ms.to_string(),
        row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        row.failure_reason.clone().unwrap_or_default(),
    ];

    match &row.metrics {
        Some(metrics) => {
            record.extend(MetricFeature::iter().map(|feature| metrics.get(feature).to_string()));
            record.push(metrics.version.to_string());
        }
        None => record.extend(empty_cells(MetricFeature::iter().len() + 1)),
    }

    let rules = default_rules();
    match &row.accessibility {
        Some(accessibility) => {
            record.push(accessibility.compliance_percent.to_string());
            record.push(accessibility.ruleset_version.to_string());
            record.extend(rules.iter().map(|rule| {
                accessibility
                    .outcome(rule.id)
                    .map(|outcome| outcome.to_string())
                    .unwrap_or_default()
            }));
        }
        None => record.extend(empty_cells(rules.len() + 2)),
    }

    match &row.threat {
        Some(threat) => {
            record.push(threat.risk_score.to_string());
            record.push(threat.tracker_count.to_string());
            record.push(threat.weights_version.to_string());
            record.extend(
                ThreatIndicator::iter()
                    .map(|indicator| u8::from(threat.contains(indicator)).to_string()),
            );
        }
        None => record.extend(empty_cells(ThreatIndicator::iter().len() + 3)),
    }

    record
}
