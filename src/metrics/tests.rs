use strum::IntoEnumIterator;

use super::*;

fn value(record: &MetricRecord, feature: MetricFeature) -> f64 {
    record
        .get(feature)
        .as_f64()
        .unwrap_or_else(|| panic!("{feature} should be computable"))
}

#[test]
fn test_every_feature_is_recorded() {
    let record = extract(b"<html><body></body></html>");
    for feature in MetricFeature::iter() {
        assert!(record.values.contains_key(&feature), "missing {feature}");
    }
    assert_eq!(record.version, crate::config::METRIC_SET_VERSION);
}

#[test]
fn test_alt_ratio_ten_images_three_missing() {
    let mut html = String::from("<html lang=\"en\"><body>");
    for i in 0..7 {
        html.push_str(&format!("<img src=\"{i}.png\" alt=\"Chart {i}\">"));
    }
    for i in 7..10 {
        html.push_str(&format!("<img src=\"{i}.png\">"));
    }
    html.push_str("</body></html>");

    let record = extract(html.as_bytes());

    assert_eq!(value(&record, MetricFeature::ImageCount), 10.0);
    assert_eq!(value(&record, MetricFeature::ImagesMissingAlt), 3.0);
    assert!((value(&record, MetricFeature::AltTextMissingRatio) - 0.3).abs() < 1e-9);
    assert!((value(&record, MetricFeature::MeaningfulAltRatio) - 0.7).abs() < 1e-9);
}

#[test]
fn test_ratios_without_denominator_are_na() {
    let record = extract(b"<html><body><p>text only</p></body></html>");

    assert_eq!(value(&record, MetricFeature::ImageCount), 0.0);
    for feature in [
        MetricFeature::AltTextMissingRatio,
        MetricFeature::MeaningfulAltRatio,
        MetricFeature::LinkTextMatchRatio,
        MetricFeature::LabeledInputRatio,
        MetricFeature::LowContrastRatio,
        MetricFeature::MeanContrast,
    ] {
        assert_eq!(record.get(feature), MetricValue::NotComputable, "{feature}");
    }
    assert!(record.has_not_computable());
}

#[test]
fn test_placeholder_alt_is_not_meaningful() {
    let record = extract(
        br#"<img alt="Image"><img alt="an image of a cat"><img alt="Picture of us">
            <img alt=""><img alt="Quarterly revenue chart">"#,
    );
    assert!((value(&record, MetricFeature::MeaningfulAltRatio) - 0.2).abs() < 1e-9);
    assert_eq!(value(&record, MetricFeature::ImagesMissingAlt), 0.0);
}

#[test]
fn test_link_metrics() {
    let record = extract(
        br#"<a href="/about-us">About us</a>
            <a href="/contact">Write to us</a>
            <a href="/x"><img src="i.png"></a>
            <a href="/pricing"></a>"#,
    );
    assert_eq!(value(&record, MetricFeature::LinkCount), 4.0);
    assert!((value(&record, MetricFeature::LinkTextMatchRatio) - 0.25).abs() < 1e-9);
    assert_eq!(value(&record, MetricFeature::EmptyLinkCount), 2.0);
}

#[test]
fn test_labeled_input_ratio() {
    let record = extract(
        br#"<form><label for="q">Search</label><input id="q" type="search">
            <input type="text" name="other"><input type="hidden" name="token">
            <label>Remember <input type="checkbox"></label><button>Go</button></form>"#,
    );
    assert_eq!(value(&record, MetricFeature::InputCount), 3.0);
    assert!((value(&record, MetricFeature::LabeledInputRatio) - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_structure_counts() {
    let record = extract(
        br#"<html lang="en"><body><nav role="navigation" aria-label="Main">
            <h1>Title</h1><div><div><span aria-hidden="true" aria-live="off">x</span></div></div>
            <h2>Sub</h2></nav></body></html>"#,
    );
    assert_eq!(value(&record, MetricFeature::HasLang), 1.0);
    assert_eq!(value(&record, MetricFeature::HeadingCount), 2.0);
    assert_eq!(value(&record, MetricFeature::RoleAttributeCount), 1.0);
    assert_eq!(value(&record, MetricFeature::AriaAttributeCount), 3.0);
    // html > body > nav > div > div > span
    assert_eq!(value(&record, MetricFeature::DomMaxDepth), 6.0);
    // html, head, body, nav, h1, div, div, span, h2
    assert_eq!(value(&record, MetricFeature::DomElementCount), 9.0);
}

#[test]
fn test_contrast_metrics() {
    let record = extract(
        br#"<p style="color:#000;background:#fff">a</p>
            <p style="color:#777;background-color:#fff">b</p>
            <p style="color:nonsense;background:#fff">c</p>"#,
    );
    assert_eq!(value(&record, MetricFeature::ContrastSampleCount), 2.0);
    assert!((value(&record, MetricFeature::LowContrastRatio) - 0.5).abs() < 1e-9);
    let mean = value(&record, MetricFeature::MeanContrast);
    assert!(mean > 10.0 && mean < 13.0, "mean contrast {mean}");
}

#[test]
fn test_non_utf8_and_empty_content() {
    let record = extract(b"<p>caf\xe9</p>");
    assert_eq!(value(&record, MetricFeature::ImageCount), 0.0);

    let empty = extract(b"");
    assert_eq!(value(&empty, MetricFeature::HasLang), 0.0);
    assert_eq!(value(&empty, MetricFeature::LinkCount), 0.0);
}

#[test]
fn test_values_serialize_with_na_sentinel() {
    let record = extract(b"<html lang=\"en\"></html>");
    let json = serde_json::to_value(&record).expect("serialize");
    assert_eq!(json["has_lang"], serde_json::json!(1.0));
    assert_eq!(json["mean_contrast"], serde_json::json!("NA"));
}
