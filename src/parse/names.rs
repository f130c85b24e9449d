//! Accessible names, labels, and form controls.

use std::collections::HashSet;

use scraper::ElementRef;

use super::selectors::{FORM_CONTROL, IMG, LABEL};
use super::PageDocument;

/// Input types that are not data-entry controls.
const NON_CONTROL_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Element text with whitespace runs collapsed to single spaces.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty_attr(element: ElementRef<'_>, name: &str) -> bool {
    element
        .value()
        .attr(name)
        .is_some_and(|value| !value.trim().is_empty())
}

/// True for `input` elements that take user data, `select`, and `textarea`.
pub fn is_form_control(element: ElementRef<'_>) -> bool {
    match element.value().name() {
        "select" | "textarea" => true,
        "input" => {
            let input_type = element
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_default();
            !NON_CONTROL_INPUT_TYPES.contains(&input_type.as_str())
        }
        _ => false,
    }
}

/// All form controls on the page, in document order.
pub fn form_controls(page: &PageDocument) -> Vec<ElementRef<'_>> {
    page.select(&FORM_CONTROL)
        .filter(|element| is_form_control(*element))
        .collect()
}

/// Ids referenced by `<label for>` on the page.
pub fn label_targets(page: &PageDocument) -> HashSet<String> {
    page.select(&LABEL)
        .filter_map(|label| label.value().attr("for"))
        .map(|target| target.trim().to_string())
        .filter(|target| !target.is_empty())
        .collect()
}

/// True when a `<label>` names the control, by `for`/`id` or by nesting.
pub fn has_associated_label(element: ElementRef<'_>, label_targets: &HashSet<String>) -> bool {
    let by_id = element
        .value()
        .id()
        .is_some_and(|id| label_targets.contains(id.trim()));
    by_id
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| ancestor.value().name() == "label")
}

/// True when the element exposes an accessible name.
///
/// Sources considered: visible text, `aria-label`, `aria-labelledby`, `title`,
/// and the `alt` of a nested image.
pub fn has_accessible_name(element: ElementRef<'_>) -> bool {
    !normalized_text(element).is_empty()
        || non_empty_attr(element, "aria-label")
        || non_empty_attr(element, "aria-labelledby")
        || non_empty_attr(element, "title")
        || element
            .select(&IMG)
            .any(|img| non_empty_attr(img, "alt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_controls_exclude_buttons_and_hidden() {
        let page = PageDocument::parse(
            br#"<form><input type="text"><input type="HIDDEN"><input type="submit">
                <input><select></select><textarea></textarea><input type="image"></form>"#,
        );
        assert_eq!(form_controls(&page).len(), 4);
    }

    #[test]
    fn test_label_association() {
        let page = PageDocument::parse(
            br#"<label for="email">Email</label><input id="email">
                <label>Name <input id="name"></label>
                <input id="orphan">"#,
        );
        let targets = label_targets(&page);
        let labelled: Vec<bool> = form_controls(&page)
            .into_iter()
            .map(|control| has_associated_label(control, &targets))
            .collect();
        assert_eq!(labelled, vec![true, true, false]);
    }

    #[test]
    fn test_accessible_name_sources() {
        let page = PageDocument::parse(
            br#"<a href="/1">Text</a><a href="/2" aria-label="Two"></a>
                <a href="/3"><img src="x.png" alt="Three"></a><a href="/4"> </a>
                <a href="/5"><img src="y.png"></a>"#,
        );
        let named: Vec<bool> = page
            .select(&crate::parse::selectors::ANCHOR_WITH_HREF)
            .map(has_accessible_name)
            .collect();
        assert_eq!(named, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_normalized_text_collapses_whitespace() {
        let page = PageDocument::parse(b"<p>  Hello \n  <b>big</b>\tworld </p>");
        let p = page
            .select(&crate::parse::selectors::ANY_ELEMENT)
            .find(|e| e.value().name() == "p")
            .expect("paragraph");
        assert_eq!(normalized_text(p), "Hello big world");
    }
}
