//! Base page metrics.
//!
//! A fixed, versioned feature set computed from the raw page content. Ratios
//! whose denominator is zero are recorded as `NA` rather than guessed.
//!
//! Three of the ratios carry the names used by the earlier scraper:
//! `meaningful_alt_ratio` (ITAA), `link_text_match_ratio` (HAM), and
//! `labeled_input_ratio` (LIM).

mod types;

use std::collections::BTreeMap;

use scraper::ElementRef;

use crate::parse::selectors::{ANCHOR_WITH_HREF, ANY_ELEMENT, HEADING, IMG, WITH_ROLE};
use crate::parse::style::{contrast_samples, MIN_TEXT_CONTRAST};
use crate::parse::{
    form_controls, has_accessible_name, has_associated_label, label_targets, normalized_text,
    PageDocument,
};

pub use types::{MetricFeature, MetricRecord, MetricValue};

/// Alt texts that describe the fact of an image rather than its content.
const PLACEHOLDER_ALT_PHRASES: &[&str] = &["image of", "picture of", "graphic of"];

/// Shortest link-text word compared against the href.
const MIN_LINK_WORD_LEN: usize = 3;

/// Computes the metric record for raw page content.
pub fn extract(raw_content: &[u8]) -> MetricRecord {
    extract_metrics(&PageDocument::parse(raw_content))
}

/// Computes the metric record for an already parsed page.
pub fn extract_metrics(page: &PageDocument) -> MetricRecord {
    let mut values = BTreeMap::new();
    let mut put = |feature: MetricFeature, value: MetricValue| {
        values.insert(feature, value);
    };

    put(
        MetricFeature::DomElementCount,
        MetricValue::count(page.select(&ANY_ELEMENT).count()),
    );
    put(
        MetricFeature::DomMaxDepth,
        MetricValue::count(max_depth(page.root())),
    );
    put(
        MetricFeature::ParseErrorCount,
        MetricValue::count(page.parse_error_count()),
    );

    let images: Vec<ElementRef<'_>> = page.select(&IMG).collect();
    let missing_alt = images
        .iter()
        .filter(|img| img.value().attr("alt").is_none())
        .count();
    let meaningful_alt = images
        .iter()
        .filter(|img| img.value().attr("alt").is_some_and(is_meaningful_alt))
        .count();
    put(MetricFeature::ImageCount, MetricValue::count(images.len()));
    put(
        MetricFeature::ImagesMissingAlt,
        MetricValue::count(missing_alt),
    );
    put(
        MetricFeature::AltTextMissingRatio,
        MetricValue::ratio(missing_alt, images.len()),
    );
    put(
        MetricFeature::MeaningfulAltRatio,
        MetricValue::ratio(meaningful_alt, images.len()),
    );

    let links: Vec<ElementRef<'_>> = page.select(&ANCHOR_WITH_HREF).collect();
    let matching_links = links.iter().filter(|link| link_text_matches(**link)).count();
    let empty_links = links
        .iter()
        .filter(|link| !has_accessible_name(**link))
        .count();
    put(MetricFeature::LinkCount, MetricValue::count(links.len()));
    put(
        MetricFeature::LinkTextMatchRatio,
        MetricValue::ratio(matching_links, links.len()),
    );
    put(MetricFeature::EmptyLinkCount, MetricValue::count(empty_links));

    let controls = form_controls(page);
    let targets = label_targets(page);
    let labeled = controls
        .iter()
        .filter(|control| has_associated_label(**control, &targets))
        .count();
    put(MetricFeature::InputCount, MetricValue::count(controls.len()));
    put(
        MetricFeature::LabeledInputRatio,
        MetricValue::ratio(labeled, controls.len()),
    );

    let aria_attributes = page
        .select(&ANY_ELEMENT)
        .map(|element| {
            element
                .value()
                .attrs()
                .filter(|(name, _)| name.starts_with("aria-"))
                .count()
        })
        .sum();
    put(
        MetricFeature::AriaAttributeCount,
        MetricValue::count(aria_attributes),
    );
    put(
        MetricFeature::RoleAttributeCount,
        MetricValue::count(page.select(&WITH_ROLE).count()),
    );
    put(
        MetricFeature::HeadingCount,
        MetricValue::count(page.select(&HEADING).count()),
    );
    put(
        MetricFeature::HasLang,
        MetricValue::count(usize::from(page.lang().is_some())),
    );

    let samples = contrast_samples(page);
    let low_contrast = samples
        .iter()
        .filter(|ratio| **ratio < MIN_TEXT_CONTRAST)
        .count();
    put(
        MetricFeature::ContrastSampleCount,
        MetricValue::count(samples.len()),
    );
    put(
        MetricFeature::LowContrastRatio,
        MetricValue::ratio(low_contrast, samples.len()),
    );
    put(MetricFeature::MeanContrast, mean(&samples));

    MetricRecord::new(values)
}

/// Depth of the deepest element below `root`, counting `root` as 1.
fn max_depth(root: ElementRef<'_>) -> usize {
    // Explicit stack: hostile pages can nest deeper than the call stack allows
    let mut stack = vec![(root, 1usize)];
    let mut deepest = 0;
    while let Some((element, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(
            element
                .children()
                .filter_map(ElementRef::wrap)
                .map(|child| (child, depth + 1)),
        );
    }
    deepest
}

fn is_meaningful_alt(alt: &str) -> bool {
    let alt = alt.trim().to_lowercase();
    !alt.is_empty()
        && alt != "image"
        && !PLACEHOLDER_ALT_PHRASES
            .iter()
            .any(|phrase| alt.contains(phrase))
}

/// True when a word of the link's visible text appears in its href.
fn link_text_matches(link: ElementRef<'_>) -> bool {
    let Some(href) = link.value().attr("href") else {
        return false;
    };
    let href = href.to_lowercase();
    normalized_text(link)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_LINK_WORD_LEN)
        .any(|word| href.contains(word))
}

fn mean(samples: &[f64]) -> MetricValue {
    if samples.is_empty() {
        return MetricValue::NotComputable;
    }
    #[allow(clippy::cast_precision_loss)]
    MetricValue::Value(samples.iter().sum::<f64>() / samples.len() as f64)
}

#[cfg(test)]
mod tests;
