//! Metric record types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use strum_macros::EnumIter;

use crate::config::METRIC_SET_VERSION;

/// One base metric. Declaration order is the dataset column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum MetricFeature {
    DomElementCount,
    DomMaxDepth,
    ParseErrorCount,
    ImageCount,
    ImagesMissingAlt,
    AltTextMissingRatio,
    /// Image Tag Alt Adherence.
    MeaningfulAltRatio,
    LinkCount,
    /// Hyperlink Astonishment Minimization.
    LinkTextMatchRatio,
    EmptyLinkCount,
    InputCount,
    /// Label Input Mapping.
    LabeledInputRatio,
    AriaAttributeCount,
    RoleAttributeCount,
    HeadingCount,
    HasLang,
    ContrastSampleCount,
    LowContrastRatio,
    MeanContrast,
}

impl MetricFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFeature::DomElementCount => "dom_element_count",
            MetricFeature::DomMaxDepth => "dom_max_depth",
            MetricFeature::ParseErrorCount => "parse_error_count",
            MetricFeature::ImageCount => "image_count",
            MetricFeature::ImagesMissingAlt => "images_missing_alt",
            MetricFeature::AltTextMissingRatio => "alt_text_missing_ratio",
            MetricFeature::MeaningfulAltRatio => "meaningful_alt_ratio",
            MetricFeature::LinkCount => "link_count",
            MetricFeature::LinkTextMatchRatio => "link_text_match_ratio",
            MetricFeature::EmptyLinkCount => "empty_link_count",
            MetricFeature::InputCount => "input_count",
            MetricFeature::LabeledInputRatio => "labeled_input_ratio",
            MetricFeature::AriaAttributeCount => "aria_attribute_count",
            MetricFeature::RoleAttributeCount => "role_attribute_count",
            MetricFeature::HeadingCount => "heading_count",
            MetricFeature::HasLang => "has_lang",
            MetricFeature::ContrastSampleCount => "contrast_sample_count",
            MetricFeature::LowContrastRatio => "low_contrast_ratio",
            MetricFeature::MeanContrast => "mean_contrast",
        }
    }
}

impl fmt::Display for MetricFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric value, or the `NA` sentinel when the page gives nothing to measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    NotComputable,
}

impl MetricValue {
    /// `numerator / denominator`, or `NA` when the denominator is zero.
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            MetricValue::NotComputable
        } else {
            #[allow(clippy::cast_precision_loss)]
            MetricValue::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn count(count: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        MetricValue::Value(count as f64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Value(value) => Some(*value),
            MetricValue::NotComputable => None,
        }
    }

    pub fn is_computable(&self) -> bool {
        matches!(self, MetricValue::Value(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(value) => write!(f, "{value}"),
            MetricValue::NotComputable => f.write_str("NA"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(value) => serializer.serialize_f64(*value),
            MetricValue::NotComputable => serializer.serialize_str("NA"),
        }
    }
}

/// Base metrics of one page, keyed by feature.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub values: BTreeMap<MetricFeature, MetricValue>,
    pub version: &'static str,
}

impl MetricRecord {
    pub fn new(values: BTreeMap<MetricFeature, MetricValue>) -> Self {
        Self {
            values,
            version: METRIC_SET_VERSION,
        }
    }

    /// The value of a feature; features never recorded read as `NA`.
    pub fn get(&self, feature: MetricFeature) -> MetricValue {
        self.values
            .get(&feature)
            .copied()
            .unwrap_or(MetricValue::NotComputable)
    }

    pub fn has_not_computable(&self) -> bool {
        self.values.values().any(|value| !value.is_computable())
    }
}

impl Serialize for MetricRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.values
                .iter()
                .map(|(feature, value)| (feature.as_str(), value)),
        )
    }
}
