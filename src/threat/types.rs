//! Threat indicator types.

use std::collections::BTreeSet;

use serde::Serialize;
use strum_macros::EnumIter;

use crate::config::THREAT_WEIGHTS_VERSION;

/// Which family an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatCategory {
    Phishing,
    Leakage,
}

/// A single heuristic signal. Declaration order is the dataset column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThreatIndicator {
    /// Password field on an http page, or posted to an http action
    PasswordOverHttp,
    /// Password form posting to another registrable domain
    PasswordThirdPartyAction,
    /// Punycode label, digit-substituted brand, or brand used as a sub-label
    LookalikeDomain,
    IpAddressHost,
    HiddenIframe,
    /// Meta refresh that sends the visitor to another site
    OffsiteMetaRefresh,
    /// `eval`/`document.write` fed from `unescape`/`atob`/`fromCharCode`
    ObfuscatedScript,
    /// Credential-shaped string in the page source
    ExposedSecret,
    InternalIpDisclosed,
    EmailAddressExposed,
    ServerVersionDisclosed,
    MissingHsts,
    MissingCsp,
    MissingContentTypeOptions,
    MissingFrameOptions,
    /// https page loading http subresources
    MixedContent,
    HighTrackerDensity,
}

impl ThreatIndicator {
    /// Short code for the indicator (for dataset columns and storage)
    pub fn code(&self) -> &'static str {
        match self {
            ThreatIndicator::PasswordOverHttp => "password_over_http",
            ThreatIndicator::PasswordThirdPartyAction => "password_third_party_action",
            ThreatIndicator::LookalikeDomain => "lookalike_domain",
            ThreatIndicator::IpAddressHost => "ip_address_host",
            ThreatIndicator::HiddenIframe => "hidden_iframe",
            ThreatIndicator::OffsiteMetaRefresh => "offsite_meta_refresh",
            ThreatIndicator::ObfuscatedScript => "obfuscated_script",
            ThreatIndicator::ExposedSecret => "exposed_secret",
            ThreatIndicator::InternalIpDisclosed => "internal_ip_disclosed",
            ThreatIndicator::EmailAddressExposed => "email_address_exposed",
            ThreatIndicator::ServerVersionDisclosed => "server_version_disclosed",
            ThreatIndicator::MissingHsts => "missing_hsts",
            ThreatIndicator::MissingCsp => "missing_csp",
            ThreatIndicator::MissingContentTypeOptions => "missing_content_type_options",
            ThreatIndicator::MissingFrameOptions => "missing_frame_options",
            ThreatIndicator::MixedContent => "mixed_content",
            ThreatIndicator::HighTrackerDensity => "high_tracker_density",
        }
    }

    pub fn category(&self) -> ThreatCategory {
        match self {
            ThreatIndicator::PasswordOverHttp
            | ThreatIndicator::PasswordThirdPartyAction
            | ThreatIndicator::LookalikeDomain
            | ThreatIndicator::IpAddressHost
            | ThreatIndicator::HiddenIframe
            | ThreatIndicator::OffsiteMetaRefresh
            | ThreatIndicator::ObfuscatedScript => ThreatCategory::Phishing,
            _ => ThreatCategory::Leakage,
        }
    }

    /// Fixed contribution to the risk score. Changing any weight requires a
    /// new `THREAT_WEIGHTS_VERSION`.
    pub fn weight(&self) -> f64 {
        match self {
            ThreatIndicator::PasswordOverHttp => 3.0,
            ThreatIndicator::PasswordThirdPartyAction => 3.0,
            ThreatIndicator::LookalikeDomain => 2.0,
            ThreatIndicator::IpAddressHost => 1.0,
            ThreatIndicator::HiddenIframe => 1.0,
            ThreatIndicator::OffsiteMetaRefresh => 1.5,
            ThreatIndicator::ObfuscatedScript => 1.0,
            ThreatIndicator::ExposedSecret => 4.0,
            ThreatIndicator::InternalIpDisclosed => 0.5,
            ThreatIndicator::EmailAddressExposed => 0.25,
            ThreatIndicator::ServerVersionDisclosed => 0.5,
            ThreatIndicator::MissingHsts => 0.5,
            ThreatIndicator::MissingCsp => 0.5,
            ThreatIndicator::MissingContentTypeOptions => 0.25,
            ThreatIndicator::MissingFrameOptions => 0.25,
            ThreatIndicator::MixedContent => 1.0,
            ThreatIndicator::HighTrackerDensity => 1.0,
        }
    }
}

/// Indicators found on one page and their weighted score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatRecord {
    pub phishing_indicators: BTreeSet<ThreatIndicator>,
    pub leakage_indicators: BTreeSet<ThreatIndicator>,
    pub risk_score: f64,
    /// Distinct known tracker hosts referenced by the page.
    pub tracker_count: usize,
    pub weights_version: &'static str,
}

impl ThreatRecord {
    /// Splits indicators by category and sums their weights.
    pub fn from_indicators(
        indicators: impl IntoIterator<Item = ThreatIndicator>,
        tracker_count: usize,
    ) -> Self {
        let (phishing_indicators, leakage_indicators): (BTreeSet<_>, BTreeSet<_>) = indicators
            .into_iter()
            .partition(|indicator| indicator.category() == ThreatCategory::Phishing);
        let risk_score = phishing_indicators
            .iter()
            .chain(&leakage_indicators)
            .map(ThreatIndicator::weight)
            .sum();
        Self {
            phishing_indicators,
            leakage_indicators,
            risk_score,
            tracker_count,
            weights_version: THREAT_WEIGHTS_VERSION,
        }
    }

    pub fn contains(&self, indicator: ThreatIndicator) -> bool {
        self.phishing_indicators.contains(&indicator) || self.leakage_indicators.contains(&indicator)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_weights_are_non_negative() {
        for indicator in ThreatIndicator::iter() {
            assert!(indicator.weight() >= 0.0, "{}", indicator.code());
        }
    }

    #[test]
    fn test_serialized_name_matches_code() {
        for indicator in ThreatIndicator::iter() {
            let json = serde_json::to_value(indicator).expect("serialize");
            assert_eq!(json, indicator.code());
        }
    }

    #[test]
    fn test_record_splits_categories_and_sums_weights() {
        let record = ThreatRecord::from_indicators(
            [
                ThreatIndicator::PasswordOverHttp,
                ThreatIndicator::MissingCsp,
                ThreatIndicator::EmailAddressExposed,
            ],
            0,
        );
        assert_eq!(record.phishing_indicators.len(), 1);
        assert_eq!(record.leakage_indicators.len(), 2);
        assert!((record.risk_score - 3.75).abs() < 1e-9);
        assert!(record.contains(ThreatIndicator::MissingCsp));
        assert!(!record.contains(ThreatIndicator::MixedContent));
    }

    #[test]
    fn test_empty_record_scores_zero() {
        let record = ThreatRecord::from_indicators(Vec::new(), 0);
        assert_eq!(record.risk_score, 0.0);
        assert_eq!(record.weights_version, THREAT_WEIGHTS_VERSION);
    }
}
