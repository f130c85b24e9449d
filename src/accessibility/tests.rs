use super::*;

const ACCESSIBLE_PAGE: &[u8] = br##"<!DOCTYPE html>
<html lang="en">
<head><title>Accessible</title><meta name="viewport" content="width=device-width, initial-scale=1"></head>
<body>
<a href="#content">Skip to content</a>
<main id="content">
  <h1>Welcome</h1>
  <h2>News</h2>
  <img src="a.png" alt="Team photo">
  <img src="divider.png" role="presentation">
  <form><label for="q">Search</label><input id="q" type="search"><button>Go</button></form>
  <table><caption>Prices</caption><tr><td>1</td></tr></table>
  <p style="color:#000;background-color:#fff">Readable</p>
  <iframe src="/map" title="Office map"></iframe>
</main>
</body>
</html>"##;

fn outcome(record: &AccessibilityRecord, id: &str) -> RuleOutcome {
    record
        .outcome(id)
        .unwrap_or_else(|| panic!("rule {id} missing"))
}

#[test]
fn test_accessible_page_passes_every_applicable_rule() {
    let record = evaluate(ACCESSIBLE_PAGE);

    assert_eq!(record.rule_results.len(), default_rules().len());
    assert!(
        record
            .rule_results
            .values()
            .all(|outcome| *outcome != RuleOutcome::Fail),
        "{:?}",
        record.rule_results
    );
    assert!((record.compliance_percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(outcome(&record, "video-caption"), RuleOutcome::NotApplicable);
    assert_eq!(outcome(&record, "meta-refresh"), RuleOutcome::NotApplicable);
    assert_eq!(record.ruleset_version, WCAG21_RULESET_VERSION);
}

#[test]
fn test_inaccessible_page_fails_rules() {
    let record = evaluate(
        br#"<html><body>
            <img src="a.png"><input type="image" src="go.png">
            <video src="v.mp4"></video>
            <table><tr><td>x</td></tr></table>
            <input type="text">
            <p style="color:#777;background:#fff">faint</p>
            <meta http-equiv="refresh" content="30">
            <marquee>news</marquee>
            <a href="/x"></a><button></button>
            <h1>a</h1><h3>b</h3>
            <div id="dup"></div><span id="dup"></span>
            <iframe src="/ad"></iframe>
            </body></html>"#,
    );

    for id in [
        "image-alt",
        "input-image-alt",
        "video-caption",
        "table-headers",
        "form-label",
        "color-contrast",
        "meta-refresh",
        "no-blink-marquee",
        "bypass-blocks",
        "document-title",
        "link-name",
        "heading-order",
        "html-lang",
        "duplicate-id",
        "button-name",
        "frame-title",
    ] {
        assert_eq!(outcome(&record, id), RuleOutcome::Fail, "{id}");
    }
    assert_eq!(
        outcome(&record, "meta-viewport-scalable"),
        RuleOutcome::NotApplicable
    );
    assert!(record.compliance_percent.abs() < f64::EPSILON);
}

#[test]
fn test_percentage_excludes_not_applicable() {
    let results: BTreeMap<String, RuleOutcome> = [
        ("a", RuleOutcome::Pass),
        ("b", RuleOutcome::Fail),
        ("c", RuleOutcome::Pass),
        ("d", RuleOutcome::NotApplicable),
        ("e", RuleOutcome::Pass),
    ]
    .into_iter()
    .map(|(id, outcome)| (id.to_string(), outcome))
    .collect();

    let record = AccessibilityRecord::from_results(results, "test");

    assert!((record.compliance_percent - 75.0).abs() < 1e-9);
}

#[test]
fn test_no_applicable_rules_scores_full() {
    let results = [("x".to_string(), RuleOutcome::NotApplicable)]
        .into_iter()
        .collect();
    let record = AccessibilityRecord::from_results(results, "test");
    assert!((record.compliance_percent - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_evaluation_is_idempotent() {
    let content = br#"<html><body><img src="x"><a href="/a">A</a><h2>x</h2><h4>y</h4></body></html>"#;
    let first = evaluate(content);
    let second = evaluate(content);
    assert_eq!(first, second);
}

#[test]
fn test_skip_link_needs_existing_target() {
    let with_target = evaluate(br##"<a href="#main">Skip</a><div id="main"></div>"##);
    assert_eq!(outcome(&with_target, "bypass-blocks"), RuleOutcome::Pass);

    let dangling = evaluate(br##"<a href="#nowhere">Skip</a>"##);
    assert_eq!(outcome(&dangling, "bypass-blocks"), RuleOutcome::Fail);

    let role_main = evaluate(br#"<div role="MAIN">content</div>"#);
    assert_eq!(outcome(&role_main, "bypass-blocks"), RuleOutcome::Pass);
}

#[test]
fn test_presentational_table_is_not_a_data_table() {
    let record = evaluate(br#"<table role="presentation"><tr><td>layout</td></tr></table>"#);
    assert_eq!(outcome(&record, "table-headers"), RuleOutcome::NotApplicable);
}

#[test]
fn test_viewport_blocking_zoom_fails() {
    let record =
        evaluate(br#"<meta name="Viewport" content="width=device-width, user-scalable=no">"#);
    assert_eq!(outcome(&record, "meta-viewport-scalable"), RuleOutcome::Fail);
}

#[test]
fn test_record_serializes_outcomes_as_strings() {
    let json = serde_json::to_value(evaluate(b"<html lang=\"en\"></html>")).expect("serialize");
    assert_eq!(json["rule_results"]["html-lang"], "pass");
    assert_eq!(json["rule_results"]["image-alt"], "na");
}
