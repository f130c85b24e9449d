//! Information-leakage indicators.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{ThreatIndicator, ThreatInput};
use crate::config::{
    HEADER_CONTENT_SECURITY_POLICY, HEADER_SERVER, HEADER_STRICT_TRANSPORT_SECURITY,
    HEADER_X_CONTENT_TYPE_OPTIONS, HEADER_X_FRAME_OPTIONS, VERSION_DISCLOSURE_HEADERS,
};
use crate::parse::selectors::{ANCHOR_WITH_HREF, SUBRESOURCE};

/// Distinct tracker hosts at which a page counts as tracker-dense.
pub(crate) const HIGH_TRACKER_DENSITY: usize = 3;

/// Third-party analytics, advertising, and session-recording hosts.
const TRACKER_HOSTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "googlesyndication.com",
    "googleadservices.com",
    "doubleclick.net",
    "facebook.net",
    "hotjar.com",
    "segment.com",
    "segment.io",
    "mixpanel.com",
    "heapanalytics.com",
    "clarity.ms",
    "quantserve.com",
    "scorecardresearch.com",
    "optimizely.com",
    "crazyegg.com",
    "mouseflow.com",
    "fullstory.com",
    "newrelic.com",
    "nr-data.net",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "adnxs.com",
    "bat.bing.com",
    "ads-twitter.com",
    "snap.licdn.com",
    "analytics.tiktok.com",
];

/// Link `rel` values that make the browser fetch the target.
const FETCHED_LINK_RELS: &[&str] = &["stylesheet", "icon", "preload", "modulepreload"];

static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // AWS access key id
        r"\bAKIA[0-9A-Z]{16}\b",
        // Google API key
        r"\bAIza[0-9A-Za-z_\-]{35}\b",
        // Slack token
        r"\bxox[baprs]-[0-9A-Za-z\-]{10,}",
        r"-----BEGIN (?:RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----",
        r#"(?i)\b(?:api[_-]?key|secret[_-]?key|access[_-]?token|client[_-]?secret)["']?\s*[:=]\s*["'][0-9A-Za-z_\-]{16,}["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static IPV4_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("valid regex")
});

static SERVER_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s*v?\d").expect("valid regex"));

pub(super) fn detect(input: &ThreatInput<'_>, found: &mut Vec<ThreatIndicator>) -> usize {
    let is_https = input.page_url.is_some_and(|url| url.scheme() == "https");

    if !input.headers.is_empty() {
        detect_header_gaps(input.headers, is_https, found);
    }
    if input.page.is_blank() {
        return 0;
    }

    let source = input.page.source();
    if SECRET_PATTERNS.iter().any(|pattern| pattern.is_match(source)) {
        found.push(ThreatIndicator::ExposedSecret);
    }
    let header_values = input.headers.values().map(String::as_str);
    if std::iter::once(source)
        .chain(header_values)
        .any(contains_private_ipv4)
    {
        found.push(ThreatIndicator::InternalIpDisclosed);
    }
    if input
        .page
        .select(&ANCHOR_WITH_HREF)
        .filter_map(|link| link.value().attr("href"))
        .any(is_mailto_address)
    {
        found.push(ThreatIndicator::EmailAddressExposed);
    }

    let subresources = subresource_urls(input);
    if is_https && subresources.iter().any(|url| url.scheme() == "http") {
        found.push(ThreatIndicator::MixedContent);
    }
    let trackers = tracker_hosts(&subresources);
    if trackers.len() >= HIGH_TRACKER_DENSITY {
        found.push(ThreatIndicator::HighTrackerDensity);
    }
    trackers.len()
}

fn detect_header_gaps(
    headers: &BTreeMap<String, String>,
    is_https: bool,
    found: &mut Vec<ThreatIndicator>,
) {
    let server_versioned = headers
        .get(HEADER_SERVER)
        .is_some_and(|server| SERVER_VERSION.is_match(server));
    if server_versioned
        || VERSION_DISCLOSURE_HEADERS
            .iter()
            .any(|name| headers.contains_key(*name))
    {
        found.push(ThreatIndicator::ServerVersionDisclosed);
    }
    if is_https && !headers.contains_key(HEADER_STRICT_TRANSPORT_SECURITY) {
        found.push(ThreatIndicator::MissingHsts);
    }
    if !headers.contains_key(HEADER_CONTENT_SECURITY_POLICY) {
        found.push(ThreatIndicator::MissingCsp);
    }
    if !headers.contains_key(HEADER_X_CONTENT_TYPE_OPTIONS) {
        found.push(ThreatIndicator::MissingContentTypeOptions);
    }
    let csp_frame_ancestors = headers
        .get(HEADER_CONTENT_SECURITY_POLICY)
        .is_some_and(|csp| csp.to_ascii_lowercase().contains("frame-ancestors"));
    if !headers.contains_key(HEADER_X_FRAME_OPTIONS) && !csp_frame_ancestors {
        found.push(ThreatIndicator::MissingFrameOptions);
    }
}

fn is_mailto_address(href: &str) -> bool {
    let href = href.trim();
    href.get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        && href.get(7..).is_some_and(|address| address.contains('@'))
}

/// True when the text mentions an RFC 1918 address.
pub(crate) fn contains_private_ipv4(text: &str) -> bool {
    IPV4_CANDIDATE
        .find_iter(text)
        .filter_map(|candidate| candidate.as_str().parse::<Ipv4Addr>().ok())
        .any(|ip| ip.is_private())
}

/// Absolute URLs of everything the page makes the browser load.
///
/// Relative references resolve against the page URL when it is known and are
/// skipped otherwise.
fn subresource_urls(input: &ThreatInput<'_>) -> Vec<Url> {
    input
        .page
        .select(&SUBRESOURCE)
        .filter(|element| {
            element.value().name() != "link"
                || element.value().attr("rel").is_some_and(|rel| {
                    rel.split_whitespace().any(|token| {
                        FETCHED_LINK_RELS
                            .iter()
                            .any(|fetched| token.eq_ignore_ascii_case(fetched))
                    })
                })
        })
        .filter_map(|element| {
            let value = element.value();
            value.attr("src").or_else(|| value.attr("href"))
        })
        .filter_map(|reference| resolve(reference.trim(), input.page_url))
        .collect()
}

fn resolve(reference: &str, base: Option<&Url>) -> Option<Url> {
    match base {
        Some(base) => base.join(reference).ok(),
        None if reference.starts_with("//") => Url::parse(&format!("https:{reference}")).ok(),
        None => Url::parse(reference).ok(),
    }
}

fn tracker_hosts(urls: &[Url]) -> BTreeSet<&'static str> {
    urls.iter()
        .filter_map(Url::host_str)
        .filter_map(|host| {
            let host = host.to_ascii_lowercase();
            TRACKER_HOSTS.iter().copied().find(|tracker| {
                host == *tracker || host.ends_with(&format!(".{tracker}"))
            })
        })
        .collect()
}
