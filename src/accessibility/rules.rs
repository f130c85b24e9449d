//! Default WCAG 2.1 rule set.
//!
//! Each rule inspects the parsed page on its own and reports pass, fail, or
//! not-applicable. Rules never look at the network or at computed styles.

use std::collections::HashSet;

use scraper::ElementRef;

use super::{RuleOutcome, WcagRule};
use crate::parse::selectors::{
    ANCHOR_WITH_HREF, BLINK_OR_MARQUEE, BUTTON, FRAME, HEADING, IMG, INPUT, MAIN_LANDMARK, META,
    TABLE, TABLE_HEADER, TRACK, VIDEO, WITH_ID,
};
use crate::parse::style::{contrast_samples, MIN_TEXT_CONTRAST};
use crate::parse::{
    form_controls, has_accessible_name, has_associated_label, label_targets, PageDocument,
};

/// Smallest `maximum-scale` that still lets users zoom to 200%.
const MIN_MAXIMUM_SCALE: f64 = 2.0;

pub(super) static RULES: &[WcagRule] = &[
    WcagRule {
        id: "image-alt",
        criterion: "1.1.1",
        description: "Images have a text alternative",
        check: image_alt,
    },
    WcagRule {
        id: "input-image-alt",
        criterion: "1.1.1",
        description: "Image buttons have a text alternative",
        check: input_image_alt,
    },
    WcagRule {
        id: "video-caption",
        criterion: "1.2.2",
        description: "Videos provide captions",
        check: video_caption,
    },
    WcagRule {
        id: "table-headers",
        criterion: "1.3.1",
        description: "Data tables have headers or a caption",
        check: table_headers,
    },
    WcagRule {
        id: "form-label",
        criterion: "1.3.1/4.1.2",
        description: "Form controls are labelled",
        check: form_label,
    },
    WcagRule {
        id: "color-contrast",
        criterion: "1.4.3",
        description: "Declared text colours meet 4.5:1 contrast",
        check: color_contrast,
    },
    WcagRule {
        id: "meta-viewport-scalable",
        criterion: "1.4.4",
        description: "The viewport does not block zooming",
        check: meta_viewport_scalable,
    },
    WcagRule {
        id: "meta-refresh",
        criterion: "2.2.1",
        description: "The page does not refresh on a timer",
        check: meta_refresh,
    },
    WcagRule {
        id: "no-blink-marquee",
        criterion: "2.2.2",
        description: "No blinking or scrolling elements",
        check: no_blink_marquee,
    },
    WcagRule {
        id: "bypass-blocks",
        criterion: "2.4.1",
        description: "A main landmark or skip link is present",
        check: bypass_blocks,
    },
    WcagRule {
        id: "document-title",
        criterion: "2.4.2",
        description: "The page has a title",
        check: document_title,
    },
    WcagRule {
        id: "link-name",
        criterion: "2.4.4",
        description: "Links have an accessible name",
        check: link_name,
    },
    WcagRule {
        id: "heading-order",
        criterion: "1.3.1",
        description: "Heading levels increase one at a time",
        check: heading_order,
    },
    WcagRule {
        id: "html-lang",
        criterion: "3.1.1",
        description: "The page declares its language",
        check: html_lang,
    },
    WcagRule {
        id: "duplicate-id",
        criterion: "4.1.1",
        description: "Element ids are unique",
        check: duplicate_id,
    },
    WcagRule {
        id: "button-name",
        criterion: "4.1.2",
        description: "Buttons have an accessible name",
        check: button_name,
    },
    WcagRule {
        id: "frame-title",
        criterion: "4.1.2",
        description: "Frames have a title",
        check: frame_title,
    },
];

/// Not applicable when `items` is empty, else pass iff every item satisfies `ok`.
fn all_of<'a, I>(items: I, ok: impl Fn(ElementRef<'a>) -> bool) -> RuleOutcome
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    let mut seen = false;
    for item in items {
        seen = true;
        if !ok(item) {
            return RuleOutcome::Fail;
        }
    }
    if seen {
        RuleOutcome::Pass
    } else {
        RuleOutcome::NotApplicable
    }
}

fn attr_lower(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(|value| value.trim().to_ascii_lowercase())
}

fn non_empty_attr(element: ElementRef<'_>, name: &str) -> bool {
    element
        .value()
        .attr(name)
        .is_some_and(|value| !value.trim().is_empty())
}

fn is_presentational(element: ElementRef<'_>) -> bool {
    matches!(
        attr_lower(element, "role").as_deref(),
        Some("none" | "presentation")
    )
}

fn image_alt(page: &PageDocument) -> RuleOutcome {
    all_of(page.select(&IMG), |img| {
        img.value().attr("alt").is_some() || is_presentational(img)
    })
}

fn input_image_alt(page: &PageDocument) -> RuleOutcome {
    all_of(
        page.select(&INPUT)
            .filter(|input| attr_lower(*input, "type").as_deref() == Some("image")),
        |input| non_empty_attr(input, "alt"),
    )
}

fn video_caption(page: &PageDocument) -> RuleOutcome {
    all_of(page.select(&VIDEO), |video| {
        video.select(&TRACK).any(|track| {
            matches!(
                attr_lower(track, "kind").as_deref(),
                Some("captions" | "subtitles")
            )
        })
    })
}

fn table_headers(page: &PageDocument) -> RuleOutcome {
    all_of(
        page.select(&TABLE).filter(|table| !is_presentational(*table)),
        |table| table.select(&TABLE_HEADER).next().is_some(),
    )
}

fn form_label(page: &PageDocument) -> RuleOutcome {
    let targets = label_targets(page);
    all_of(form_controls(page), |control| {
        has_associated_label(control, &targets)
            || non_empty_attr(control, "aria-label")
            || non_empty_attr(control, "aria-labelledby")
            || non_empty_attr(control, "title")
    })
}

fn color_contrast(page: &PageDocument) -> RuleOutcome {
    let samples = contrast_samples(page);
    if samples.is_empty() {
        RuleOutcome::NotApplicable
    } else if samples.iter().all(|ratio| *ratio >= MIN_TEXT_CONTRAST) {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    }
}

fn meta_with<'a>(
    page: &'a PageDocument,
    attribute: &'static str,
    value: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    page.select(&META)
        .filter(move |meta| attr_lower(*meta, attribute).as_deref() == Some(value))
}

/// True when a viewport `content` value leaves pinch-zoom available.
fn viewport_allows_zoom(content: &str) -> bool {
    content
        .split([',', ';'])
        .filter_map(|pair| pair.split_once('='))
        .all(|(key, value)| {
            let value = value.trim().to_ascii_lowercase();
            match key.trim().to_ascii_lowercase().as_str() {
                "user-scalable" => !matches!(value.as_str(), "no" | "0"),
                "maximum-scale" => value
                    .parse::<f64>()
                    .map_or(true, |scale| scale >= MIN_MAXIMUM_SCALE),
                _ => true,
            }
        })
}

fn meta_viewport_scalable(page: &PageDocument) -> RuleOutcome {
    all_of(meta_with(page, "name", "viewport"), |meta| {
        viewport_allows_zoom(meta.value().attr("content").unwrap_or_default())
    })
}

/// Delay in seconds of a `meta refresh` `content` value, if it parses.
pub(crate) fn refresh_delay(content: &str) -> Option<f64> {
    let delay = content.split([';', ',']).next()?.trim();
    delay.parse::<f64>().ok().filter(|d| *d >= 0.0)
}

fn meta_refresh(page: &PageDocument) -> RuleOutcome {
    // Browsers ignore a refresh whose delay does not parse
    all_of(meta_with(page, "http-equiv", "refresh"), |meta| {
        refresh_delay(meta.value().attr("content").unwrap_or_default())
            .map_or(true, |delay| delay == 0.0)
    })
}

fn no_blink_marquee(page: &PageDocument) -> RuleOutcome {
    if page.select(&BLINK_OR_MARQUEE).next().is_some() {
        RuleOutcome::Fail
    } else {
        RuleOutcome::Pass
    }
}

fn bypass_blocks(page: &PageDocument) -> RuleOutcome {
    let has_main = page.select(&MAIN_LANDMARK).any(|element| {
        element.value().name() == "main" || attr_lower(element, "role").as_deref() == Some("main")
    });
    if has_main {
        return RuleOutcome::Pass;
    }
    let ids: HashSet<&str> = page
        .select(&WITH_ID)
        .filter_map(|element| element.value().id())
        .collect();
    let has_skip_link = page.select(&ANCHOR_WITH_HREF).any(|link| {
        link.value()
            .attr("href")
            .and_then(|href| href.trim().strip_prefix('#'))
            .is_some_and(|target| !target.is_empty() && ids.contains(target))
    });
    if has_skip_link {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    }
}

fn document_title(page: &PageDocument) -> RuleOutcome {
    if page.title().is_some() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    }
}

fn link_name(page: &PageDocument) -> RuleOutcome {
    all_of(page.select(&ANCHOR_WITH_HREF), has_accessible_name)
}

fn heading_order(page: &PageDocument) -> RuleOutcome {
    let levels: Vec<u32> = page
        .select(&HEADING)
        .filter_map(|heading| {
            heading
                .value()
                .name()
                .strip_prefix('h')
                .and_then(|level| level.parse().ok())
        })
        .collect();
    if levels.is_empty() {
        RuleOutcome::NotApplicable
    } else if levels.windows(2).all(|pair| pair[1] <= pair[0] + 1) {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    }
}

fn html_lang(page: &PageDocument) -> RuleOutcome {
    if page.lang().is_some() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    }
}

fn duplicate_id(page: &PageDocument) -> RuleOutcome {
    let mut seen = HashSet::new();
    let mut any = false;
    for id in page
        .select(&WITH_ID)
        .filter_map(|element| element.value().id())
        .filter(|id| !id.is_empty())
    {
        any = true;
        if !seen.insert(id) {
            return RuleOutcome::Fail;
        }
    }
    if any {
        RuleOutcome::Pass
    } else {
        RuleOutcome::NotApplicable
    }
}

fn button_name(page: &PageDocument) -> RuleOutcome {
    all_of(page.select(&BUTTON), has_accessible_name)
}

fn frame_title(page: &PageDocument) -> RuleOutcome {
    all_of(page.select(&FRAME), |frame| non_empty_attr(frame, "title"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_allows_zoom() {
        assert!(viewport_allows_zoom("width=device-width, initial-scale=1"));
        assert!(viewport_allows_zoom("width=device-width, maximum-scale=5"));
        assert!(!viewport_allows_zoom("width=device-width, user-scalable=no"));
        assert!(!viewport_allows_zoom("maximum-scale=1.0"));
        assert!(!viewport_allows_zoom("user-scalable=0"));
    }

    #[test]
    fn test_refresh_delay() {
        assert_eq!(refresh_delay("0; url=https://example.com/"), Some(0.0));
        assert_eq!(refresh_delay("30"), Some(30.0));
        assert_eq!(refresh_delay(" 5 ;URL=/next"), Some(5.0));
        assert_eq!(refresh_delay("soon"), None);
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let ids: HashSet<&str> = RULES.iter().map(|rule| rule.id).collect();
        assert_eq!(ids.len(), RULES.len());
    }
}
