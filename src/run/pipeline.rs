//! The three evaluators run over one fetched page.

use std::collections::BTreeMap;
use std::sync::Arc;

use url::Url;

use crate::accessibility::{AccessibilityEvaluator, AccessibilityRecord, WcagRuleEngine};
use crate::metrics::{extract_metrics, MetricRecord};
use crate::parse::PageDocument;
use crate::threat::{HeuristicThreatEvaluator, ThreatEvaluator, ThreatInput, ThreatRecord};

/// Records produced for one page.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: MetricRecord,
    pub accessibility: AccessibilityRecord,
    pub threat: ThreatRecord,
}

/// Evaluators applied to every fetched page.
///
/// Cloning is cheap; each clone shares the same evaluators.
#[derive(Clone)]
pub struct EvaluationPipeline {
    pub accessibility: Arc<dyn AccessibilityEvaluator>,
    pub threat: Arc<dyn ThreatEvaluator>,
}

impl Default for EvaluationPipeline {
    fn default() -> Self {
        Self {
            accessibility: Arc::new(WcagRuleEngine::default()),
            threat: Arc::new(HeuristicThreatEvaluator),
        }
    }
}

impl EvaluationPipeline {
    /// Parses `raw_content` once and runs every evaluator over it.
    ///
    /// CPU-bound; the orchestrator calls this on the blocking pool.
    pub fn evaluate(
        &self,
        raw_content: &[u8],
        headers: &BTreeMap<String, String>,
        final_url: Option<&str>,
    ) -> Evaluation {
        let page = PageDocument::parse(raw_content);
        let page_url = final_url.and_then(|url| Url::parse(url).ok());

        Evaluation {
            metrics: extract_metrics(&page),
            accessibility: self.accessibility.evaluate(&page),
            threat: self.threat.evaluate(&ThreatInput {
                page: &page,
                headers,
                page_url: page_url.as_ref(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricFeature, MetricValue};

    #[test]
    fn test_pipeline_matches_standalone_evaluators() {
        let content = br#"<!DOCTYPE html><html lang="en"><head><title>t</title></head>
            <body><img src="a.png"><img src="b.png" alt="A chart"></body></html>"#;
        let headers = BTreeMap::new();

        let evaluation = EvaluationPipeline::default().evaluate(content, &headers, None);

        assert_eq!(
            evaluation.metrics.get(MetricFeature::AltTextMissingRatio),
            MetricValue::Value(0.5)
        );
        assert_eq!(evaluation.accessibility, crate::accessibility::evaluate(content));
        assert_eq!(
            evaluation.threat,
            crate::threat::evaluate(content, &headers, None)
        );
    }
}
