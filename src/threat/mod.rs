//! Phishing and information-leakage heuristics.
//!
//! Every indicator carries a fixed weight; the risk score is the sum of the
//! weights of the indicators a page triggers. An indicator either fires or it
//! does not, so adding content can only add to the score. Missing inputs
//! trigger nothing: no headers means no header checks, blank content means no
//! content checks, and an unknown page URL skips the origin comparisons.

mod leakage;
mod phishing;
mod types;

use std::collections::BTreeMap;

use url::Url;

use crate::parse::PageDocument;

pub use types::{ThreatCategory, ThreatIndicator, ThreatRecord};

/// Everything a threat evaluator may look at.
pub struct ThreatInput<'a> {
    pub page: &'a PageDocument,
    /// Response headers, lower-case names.
    pub headers: &'a BTreeMap<String, String>,
    /// Final URL of the fetch, when known.
    pub page_url: Option<&'a Url>,
}

/// Produces a threat record for one page.
pub trait ThreatEvaluator: Send + Sync {
    fn evaluate(&self, input: &ThreatInput<'_>) -> ThreatRecord;
}

/// The default rule-based evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicThreatEvaluator;

impl ThreatEvaluator for HeuristicThreatEvaluator {
    fn evaluate(&self, input: &ThreatInput<'_>) -> ThreatRecord {
        let mut found = Vec::new();
        phishing::detect(input, &mut found);
        let tracker_count = leakage::detect(input, &mut found);
        ThreatRecord::from_indicators(found, tracker_count)
    }
}

/// Evaluates raw content and headers with the default heuristics.
pub fn evaluate(
    raw_content: &[u8],
    headers: &BTreeMap<String, String>,
    page_url: Option<&str>,
) -> ThreatRecord {
    let page = PageDocument::parse(raw_content);
    let page_url = page_url.and_then(|url| Url::parse(url).ok());
    HeuristicThreatEvaluator.evaluate(&ThreatInput {
        page: &page,
        headers,
        page_url: page_url.as_ref(),
    })
}
