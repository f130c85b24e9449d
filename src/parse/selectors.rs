//! Compiled CSS selectors shared by the evaluators.
//!
//! Attribute values such as `type` or `http-equiv` are compared by the callers
//! after lower-casing, so selectors here only match on element and attribute names.

use scraper::Selector;
use std::sync::LazyLock;

use crate::utils::parse_selector_with_fallback;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> =
            LazyLock::new(|| parse_selector_with_fallback($css, stringify!($name)));
    };
}

selector!(ANY_ELEMENT, "*");
selector!(HTML, "html");
selector!(TITLE, "title");
selector!(META, "meta");
selector!(IMG, "img");
selector!(ANCHOR_WITH_HREF, "a[href]");
selector!(LABEL, "label");
selector!(INPUT, "input");
selector!(FORM_CONTROL, "input, select, textarea");
selector!(BUTTON, "button");
selector!(HEADING, "h1, h2, h3, h4, h5, h6");
selector!(WITH_ROLE, "[role]");
selector!(WITH_ID, "[id]");
selector!(WITH_STYLE, "[style]");
selector!(VIDEO, "video");
selector!(TRACK, "track");
selector!(TABLE, "table");
selector!(TABLE_HEADER, "th, caption");
selector!(BLINK_OR_MARQUEE, "blink, marquee");
selector!(MAIN_LANDMARK, "main, [role]");
selector!(FRAME, "iframe, frame");
selector!(IFRAME, "iframe");
selector!(FORM, "form");
selector!(SCRIPT, "script");
selector!(SUBRESOURCE, "script[src], img[src], iframe[src], link[href], audio[src], video[src], source[src]");

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile_and_match() {
        let html = Html::parse_document(
            "<html><body><h1>a</h1><h3>b</h3><img src=x><a href=/>l</a><a>no</a></body></html>",
        );
        assert_eq!(html.select(&HEADING).count(), 2);
        assert_eq!(html.select(&IMG).count(), 1);
        assert_eq!(html.select(&ANCHOR_WITH_HREF).count(), 1);
        assert_eq!(html.select(&SUBRESOURCE).count(), 1);
        assert_eq!(html.select(&HTML).count(), 1);
    }
}
