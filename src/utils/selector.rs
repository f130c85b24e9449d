//! CSS selector parsing utilities.

use scraper::Selector;

/// Selector that matches nothing, used when a selector string fails to parse.
const MATCH_NOTHING: &str = "*:not(*)";

/// Parses a CSS selector with a safe fallback.
///
/// If parsing fails, logs an error and returns a selector that matches nothing
/// (`*:not(*)`), so a bad selector degrades one feature instead of the sweep.
///
/// # Arguments
///
/// * `selector_str` - The CSS selector string to parse
/// * `context` - Context description for error logging (e.g., the static's name)
pub fn parse_selector_with_fallback(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        log::error!(
            "Failed to parse CSS selector '{}' in {}: {}. Using fallback selector.",
            selector_str,
            context,
            e
        );
        parse_selector_unsafe(MATCH_NOTHING, "fallback selector")
    })
}

/// Parses a CSS selector that must succeed (for compile-time constants).
///
/// # Panics
///
/// Panics if the selector cannot be parsed (indicates a programming error).
pub fn parse_selector_unsafe(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        panic!(
            "Failed to parse CSS selector '{}' in {}: {}. This is a programming error.",
            selector_str, context, e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_fallback_selector_matches_nothing() {
        let selector = parse_selector_with_fallback("img[[[", "test");
        let html = Html::parse_document("<html><body><img></body></html>");
        assert_eq!(html.select(&selector).count(), 0);
    }

    #[test]
    fn test_valid_selector_parses() {
        let selector = parse_selector_with_fallback("a[href]", "test");
        let html = Html::parse_document("<a href=\"/\">x</a><a>y</a>");
        assert_eq!(html.select(&selector).count(), 1);
    }
}
