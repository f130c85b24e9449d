//! Inline style colours and WCAG contrast.
//!
//! Only inline `style` attributes are inspected; cascaded styles would need a
//! rendering engine. A declaration pair yields a sample when both colours parse
//! and are opaque.

use std::sync::LazyLock;

use regex::Regex;

use super::selectors::WITH_STYLE;
use super::PageDocument;

/// Minimum contrast ratio for normal text (WCAG 2.1 SC 1.4.3).
pub const MIN_TEXT_CONTRAST: f64 = 4.5;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#([0-9a-f]{3,4}|[0-9a-f]{6}|[0-9a-f]{8})$").expect("valid regex"));

static RGB_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^rgba?\(\s*([\d.]+%?)[\s,]+([\d.]+%?)[\s,]+([\d.]+%?)(?:\s*[,/]\s*([\d.]+%?))?\s*\)$",
    )
    .expect("valid regex")
});

/// First colour-looking token inside a `background` shorthand.
static COLOR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{3,8}\b|rgba?\([^)]*\)|\b[a-z]+\b").expect("valid regex")
});

/// `url(...)` references inside a `background` shorthand; file names are not colours.
static URL_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"[^"]*"|'[^']*'|[^)]*)\s*\)"#).expect("valid regex")
});

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb(0, 0, 0)),
    ("white", Rgb(255, 255, 255)),
    ("red", Rgb(255, 0, 0)),
    ("green", Rgb(0, 128, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("yellow", Rgb(255, 255, 0)),
    ("orange", Rgb(255, 165, 0)),
    ("purple", Rgb(128, 0, 128)),
    ("gray", Rgb(128, 128, 128)),
    ("grey", Rgb(128, 128, 128)),
    ("silver", Rgb(192, 192, 192)),
    ("darkgray", Rgb(169, 169, 169)),
    ("darkgrey", Rgb(169, 169, 169)),
    ("lightgray", Rgb(211, 211, 211)),
    ("lightgrey", Rgb(211, 211, 211)),
    ("maroon", Rgb(128, 0, 0)),
    ("navy", Rgb(0, 0, 128)),
    ("teal", Rgb(0, 128, 128)),
    ("olive", Rgb(128, 128, 0)),
    ("lime", Rgb(0, 255, 0)),
    ("aqua", Rgb(0, 255, 255)),
    ("cyan", Rgb(0, 255, 255)),
    ("fuchsia", Rgb(255, 0, 255)),
    ("magenta", Rgb(255, 0, 255)),
];

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

fn channel(raw: &str) -> Option<u8> {
    let value = match raw.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? * 255.0 / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    if !(0.0..=255.0).contains(&value) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.round() as u8)
}

fn is_opaque(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(alpha) => match alpha.strip_suffix('%') {
            Some(percent) => percent.parse::<f64>().is_ok_and(|p| p >= 100.0),
            None => alpha.parse::<f64>().is_ok_and(|a| a >= 1.0),
        },
    }
}

/// Parses a CSS colour value: hex, `rgb()`/`rgba()`, or a basic named colour.
///
/// Translucent colours return `None`, since their contrast depends on what is
/// painted underneath.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if let Some(caps) = HEX_COLOR.captures(value) {
        let hex = caps.get(1)?.as_str();
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d).ok()))
            .collect::<Option<_>>()?;
        return match digits.as_slice() {
            [r, g, b] => Some(Rgb(r * 17, g * 17, b * 17)),
            [r, g, b, a] => (*a == 15).then(|| Rgb(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => Some(Rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            [r1, r2, g1, g2, b1, b2, a1, a2] => {
                (a1 * 16 + a2 == 255).then(|| Rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2))
            }
            _ => None,
        };
    }
    if let Some(caps) = RGB_FUNCTION.captures(value) {
        if !is_opaque(caps.get(4).map(|m| m.as_str())) {
            return None;
        }
        return Some(Rgb(
            channel(caps.get(1)?.as_str())?,
            channel(caps.get(2)?.as_str())?,
            channel(caps.get(3)?.as_str())?,
        ));
    }
    let lower = value.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgb)| *rgb)
}

/// WCAG relative luminance of a colour.
pub fn relative_luminance(color: Rgb) -> f64 {
    let linear = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.039_28 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(color.0) + 0.7152 * linear(color.1) + 0.0722 * linear(color.2)
}

/// WCAG contrast ratio between two colours, from 1.0 to 21.0.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Foreground and background colours declared in one inline style.
///
/// Returns `None` unless both are declared and parse.
pub fn declared_colors(style: &str) -> Option<(Rgb, Rgb)> {
    let mut foreground = None;
    let mut background = None;
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_end_matches("!important").trim();
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => foreground = parse_color(value),
            "background-color" => background = parse_color(value),
            "background" => {
                let value = URL_FUNCTION.replace_all(value, " ");
                background = COLOR_TOKEN
                    .find_iter(&value)
                    .find_map(|token| parse_color(token.as_str()));
            }
            _ => {}
        }
    }
    Some((foreground?, background?))
}

/// Contrast ratios of every element whose inline style sets both colours.
pub fn contrast_samples(page: &PageDocument) -> Vec<f64> {
    page.select(&WITH_STYLE)
        .filter_map(|element| element.value().attr("style"))
        .filter_map(declared_colors)
        .map(|(fg, bg)| contrast_ratio(fg, bg))
        .collect()
}
