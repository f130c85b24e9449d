//! Tolerant HTML parsing.
//!
//! `PageDocument` wraps a `scraper::Html` tree together with the decoded source
//! text. Parsing never fails: malformed markup is repaired by html5ever and the
//! repairs are counted as parse errors. The tree is not `Send`, so documents
//! are built and consumed on the same blocking thread.

mod names;
pub(crate) mod selectors;
pub mod style;

use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

pub use names::{
    form_controls, has_accessible_name, has_associated_label, is_form_control, label_targets,
    normalized_text,
};

/// A parsed page, ready for the evaluators.
pub struct PageDocument {
    html: Html,
    source: String,
}

impl PageDocument {
    /// Parses raw content bytes; invalid UTF-8 is decoded lossily.
    pub fn parse(raw: &[u8]) -> Self {
        let source = String::from_utf8_lossy(raw).into_owned();
        let html = Html::parse_document(&source);
        Self { html, source }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Decoded source text, for pattern scans that must see scripts and comments.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the content is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Number of errors html5ever reported while repairing the markup.
    pub fn parse_error_count(&self) -> usize {
        self.html.errors.len()
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Trimmed `lang` attribute of `<html>`, if non-empty.
    pub fn lang(&self) -> Option<&str> {
        self.root()
            .value()
            .attr("lang")
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
    }

    /// Trimmed text of the first `<title>`, if non-empty.
    pub fn title(&self) -> Option<String> {
        self.select(&selectors::TITLE)
            .next()
            .map(normalized_text)
            .filter(|title| !title.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_malformed_markup() {
        let page = PageDocument::parse(b"<html><body><div><p>unclosed<span></div></body>");
        assert!(page.parse_error_count() > 0);
        assert!(!page.is_blank());
    }

    #[test]
    fn test_parse_lossy_utf8() {
        let page = PageDocument::parse(b"<title>caf\xe9</title>");
        assert_eq!(page.title(), Some("caf\u{fffd}".to_string()));
    }

    #[test]
    fn test_lang_and_title() {
        let page = PageDocument::parse(b"<html lang=' en '><title>  Home  </title></html>");
        assert_eq!(page.lang(), Some("en"));
        assert_eq!(page.title(), Some("Home".to_string()));

        let bare = PageDocument::parse(b"<html lang=''><title> </title></html>");
        assert_eq!(bare.lang(), None);
        assert_eq!(bare.title(), None);
    }

    #[test]
    fn test_blank_document() {
        assert!(PageDocument::parse(b"  \n ").is_blank());
    }
}
