//! Phishing indicators.
//!
//! Checks that compare origins (form actions, refresh targets, the page host)
//! run only when the page URL is known.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use url::Url;

use super::{ThreatIndicator, ThreatInput};
use crate::accessibility::refresh_delay;
use crate::domain::{is_ip_literal, registrable_domain, same_site};
use crate::parse::selectors::{IFRAME, INPUT, META, SCRIPT};

/// Brands most often imitated by credential phishing pages.
const IMITATED_BRANDS: &[&str] = &[
    "paypal",
    "apple",
    "icloud",
    "google",
    "gmail",
    "microsoft",
    "outlook",
    "office365",
    "amazon",
    "facebook",
    "instagram",
    "netflix",
    "linkedin",
    "dropbox",
    "adobe",
    "ebay",
    "yahoo",
    "chase",
    "wellsfargo",
    "bankofamerica",
];

static OBFUSCATED_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\beval|document\.write(?:ln)?)\s*\(\s*(?:window\.)?(?:unescape|atob|(?:String\.)?fromCharCode)\s*\(",
    )
    .expect("valid regex")
});

static REFRESH_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\s*=\s*['"]?([^'"\s]+)"#).expect("valid regex")
});

pub(super) fn detect(input: &ThreatInput<'_>, found: &mut Vec<ThreatIndicator>) {
    let page_host = input
        .page_url
        .and_then(Url::host_str)
        .map(str::to_ascii_lowercase);

    if let Some(host) = &page_host {
        if is_ip_literal(host) {
            found.push(ThreatIndicator::IpAddressHost);
        } else if is_lookalike_domain(host) {
            found.push(ThreatIndicator::LookalikeDomain);
        }
    }

    if input.page.is_blank() {
        return;
    }

    let (over_http, third_party) = password_form_risks(input, page_host.as_deref());
    if over_http {
        found.push(ThreatIndicator::PasswordOverHttp);
    }
    if third_party {
        found.push(ThreatIndicator::PasswordThirdPartyAction);
    }
    if input.page.select(&IFRAME).any(is_hidden_frame) {
        found.push(ThreatIndicator::HiddenIframe);
    }
    if let (Some(url), Some(host)) = (input.page_url, page_host.as_deref()) {
        if has_offsite_refresh(input, url, host) {
            found.push(ThreatIndicator::OffsiteMetaRefresh);
        }
    }
    if input
        .page
        .select(&SCRIPT)
        .any(|script| OBFUSCATED_CALL.is_match(&script.text().collect::<String>()))
    {
        found.push(ThreatIndicator::ObfuscatedScript);
    }
}

/// Resolves a form's submission target against the page URL.
///
/// Without a page URL only absolute actions resolve.
fn form_target(form: Option<ElementRef<'_>>, page_url: Option<&Url>) -> Option<Url> {
    let action = form
        .and_then(|f| f.value().attr("action"))
        .map(str::trim)
        .filter(|action| !action.is_empty());
    match (action, page_url) {
        (Some(action), Some(base)) => base.join(action).ok(),
        (Some(action), None) => Url::parse(action).ok(),
        (None, base) => base.cloned(),
    }
}

/// `(posted or served over http, posted to another site)` for password fields.
fn password_form_risks(input: &ThreatInput<'_>, page_host: Option<&str>) -> (bool, bool) {
    let mut over_http = false;
    let mut third_party = false;
    let page_is_http = input.page_url.is_some_and(|url| url.scheme() == "http");

    for field in input.page.select(&INPUT).filter(|field| {
        field
            .value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
    }) {
        let form = field
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name() == "form");
        let target = form_target(form, input.page_url);

        if page_is_http || target.as_ref().is_some_and(|t| t.scheme() == "http") {
            over_http = true;
        }
        if let (Some(page_host), Some(target_host)) =
            (page_host, target.as_ref().and_then(Url::host_str))
        {
            if !same_site(page_host, target_host) {
                third_party = true;
            }
        }
    }
    (over_http, third_party)
}

fn is_hidden_frame(frame: ElementRef<'_>) -> bool {
    let attrs = frame.value();
    if attrs.attr("hidden").is_some() {
        return true;
    }
    let zero = |name: &str| {
        attrs
            .attr(name)
            .map(|v| v.trim().trim_end_matches("px").trim())
            .is_some_and(|v| v == "0")
    };
    if zero("width") || zero("height") {
        return true;
    }
    let style: String = attrs
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    style.contains("display:none") || style.contains("visibility:hidden")
}

fn has_offsite_refresh(input: &ThreatInput<'_>, page_url: &Url, page_host: &str) -> bool {
    input
        .page
        .select(&META)
        .filter(|meta| {
            meta.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .filter(|content| refresh_delay(content).is_some())
        .filter_map(|content| REFRESH_TARGET.captures(content))
        .filter_map(|caps| page_url.join(caps.get(1)?.as_str()).ok())
        .any(|target| {
            target
                .host_str()
                .is_some_and(|target_host| !same_site(page_host, target_host))
        })
}

/// Maps common digit substitutions back to letters (`paypa1` → `paypal`).
fn undo_digit_substitution(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '0' => 'o',
            '1' => 'l',
            '3' => 'e',
            '4' => 'a',
            '5' => 's',
            '7' => 't',
            other => other,
        })
        .collect()
}

/// True for hosts that imitate a well-known brand.
///
/// Flags punycode labels, a brand spelled with digits anywhere in the host,
/// and a brand used as a sub-label of somebody else's registrable domain.
pub(crate) fn is_lookalike_domain(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.split('.').any(|label| label.starts_with("xn--")) {
        return true;
    }

    let registrable = registrable_domain(&host);
    let owner_label = registrable.split('.').next().unwrap_or_default();
    let is_brand = |word: &str| IMITATED_BRANDS.contains(&word);

    let digit_brand = host
        .split(['.', '-'])
        .filter(|part| part.chars().any(|c| c.is_ascii_digit()))
        .any(|part| is_brand(&undo_digit_substitution(part)));
    if digit_brand {
        return true;
    }

    if is_brand(owner_label) {
        return false;
    }
    let subdomain = host
        .strip_suffix(registrable.as_str())
        .unwrap_or_default()
        .trim_end_matches('.');
    subdomain.split(['.', '-']).any(is_brand)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookalike_domains() {
        assert!(is_lookalike_domain("paypa1.com"));
        assert!(is_lookalike_domain("secure-paypa1-login.net"));
        assert!(is_lookalike_domain("paypal.com.account-verify.net"));
        assert!(is_lookalike_domain("login-microsoft.evil.org"));
        assert!(is_lookalike_domain("xn--pypal-4ve.com"));
    }

    #[test]
    fn test_genuine_domains_are_not_lookalikes() {
        assert!(!is_lookalike_domain("www.paypal.com"));
        assert!(!is_lookalike_domain("accounts.google.co.uk"));
        assert!(!is_lookalike_domain("1password.com"));
        assert!(!is_lookalike_domain("example.com"));
        assert!(!is_lookalike_domain("web1.example.com"));
    }

    #[test]
    fn test_obfuscated_call_pattern() {
        assert!(OBFUSCATED_CALL.is_match("eval(unescape('%61%6c'))"));
        assert!(OBFUSCATED_CALL.is_match("document.write( atob('PHNjcmlwdD4='))"));
        assert!(OBFUSCATED_CALL.is_match("eval(String.fromCharCode(97,108))"));
        assert!(!OBFUSCATED_CALL.is_match("document.write('<p>hello</p>')"));
        assert!(!OBFUSCATED_CALL.is_match("medieval(atob(x))"));
    }
}
