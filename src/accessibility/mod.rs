//! WCAG 2.1 compliance estimate.
//!
//! The compliance percentage is `passed / applicable * 100`; rules that do not
//! apply to a page count toward neither side. A page where no rule applies
//! scores 100. Evaluation is a pure function of the content.

mod rules;

pub(crate) use rules::refresh_delay;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::WCAG21_RULESET_VERSION;
use crate::parse::PageDocument;

/// Result of one rule on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleOutcome {
    Pass,
    Fail,
    NotApplicable,
}

impl RuleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOutcome::Pass => "pass",
            RuleOutcome::Fail => "fail",
            RuleOutcome::NotApplicable => "na",
        }
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single automated check and the success criterion it approximates.
#[derive(Debug, Clone, Copy)]
pub struct WcagRule {
    pub id: &'static str,
    pub criterion: &'static str,
    pub description: &'static str,
    pub check: fn(&PageDocument) -> RuleOutcome,
}

/// The default rule set, in evaluation order.
pub fn default_rules() -> &'static [WcagRule] {
    rules::RULES
}

/// Per-rule results and the derived compliance percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibilityRecord {
    pub compliance_percent: f64,
    pub rule_results: BTreeMap<String, RuleOutcome>,
    pub ruleset_version: &'static str,
}

impl AccessibilityRecord {
    /// Builds a record from rule results, deriving the percentage.
    pub fn from_results(
        rule_results: BTreeMap<String, RuleOutcome>,
        ruleset_version: &'static str,
    ) -> Self {
        let applicable = rule_results
            .values()
            .filter(|outcome| **outcome != RuleOutcome::NotApplicable)
            .count();
        let passed = rule_results
            .values()
            .filter(|outcome| **outcome == RuleOutcome::Pass)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let compliance_percent = if applicable == 0 {
            100.0
        } else {
            passed as f64 / applicable as f64 * 100.0
        };
        Self {
            compliance_percent,
            rule_results,
            ruleset_version,
        }
    }

    pub fn outcome(&self, rule_id: &str) -> Option<RuleOutcome> {
        self.rule_results.get(rule_id).copied()
    }
}

/// Produces an accessibility record for a parsed page.
///
/// Implementations must be deterministic: the same page always yields the same
/// record.
pub trait AccessibilityEvaluator: Send + Sync {
    fn evaluate(&self, page: &PageDocument) -> AccessibilityRecord;
}

/// Rule-based evaluator over a static rule table.
#[derive(Debug, Clone, Copy)]
pub struct WcagRuleEngine {
    rules: &'static [WcagRule],
    version: &'static str,
}

impl WcagRuleEngine {
    pub fn new(rules: &'static [WcagRule], version: &'static str) -> Self {
        Self { rules, version }
    }

    pub fn rules(&self) -> &'static [WcagRule] {
        self.rules
    }
}

impl Default for WcagRuleEngine {
    fn default() -> Self {
        Self::new(default_rules(), WCAG21_RULESET_VERSION)
    }
}

impl AccessibilityEvaluator for WcagRuleEngine {
    fn evaluate(&self, page: &PageDocument) -> AccessibilityRecord {
        let results = self
            .rules
            .iter()
            .map(|rule| (rule.id.to_string(), (rule.check)(page)))
            .collect();
        AccessibilityRecord::from_results(results, self.version)
    }
}

/// Evaluates raw content with the default rule set.
pub fn evaluate(raw_content: &[u8]) -> AccessibilityRecord {
    WcagRuleEngine::default().evaluate(&PageDocument::parse(raw_content))
}

#[cfg(test)]
mod tests;
