//! Ranked domain entries, popularity tiers, and host name utilities.
//!
//! Key items:
//! - `DomainEntry` - one ranked input line, immutable once loaded
//! - `TierBoundaries` - rank cut-offs for the Top/Mid/Low popularity tiers
//! - `normalize_hostname()` - canonical host form used as the dataset key
//! - `registrable_domain()` - Public Suffix List based origin comparison
//! - `load_domain_list()` - reads the ranked list from disk

mod loader;

use std::net::IpAddr;

use log::warn;
use serde::Serialize;

pub use loader::{load_domain_list, parse_domain_list};

/// Maximum host name length in characters (RFC 1035).
const MAX_HOSTNAME_LENGTH: usize = 253;

/// Popularity tier derived from a domain's rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityTier {
    Top,
    Mid,
    Low,
}

impl PopularityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopularityTier::Top => "top",
            PopularityTier::Mid => "mid",
            PopularityTier::Low => "low",
        }
    }
}

impl std::fmt::Display for PopularityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive rank cut-offs: `rank <= top_max_rank` is Top, `rank <= mid_max_rank` is Mid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBoundaries {
    pub top_max_rank: u64,
    pub mid_max_rank: u64,
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self {
            top_max_rank: crate::config::DEFAULT_TOP_TIER_MAX_RANK,
            mid_max_rank: crate::config::DEFAULT_MID_TIER_MAX_RANK,
        }
    }
}

impl TierBoundaries {
    pub fn classify(&self, rank: u64) -> PopularityTier {
        if rank <= self.top_max_rank {
            PopularityTier::Top
        } else if rank <= self.mid_max_rank {
            PopularityTier::Mid
        } else {
            PopularityTier::Low
        }
    }
}

/// One ranked domain from the input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainEntry {
    pub rank: u64,
    pub hostname: String,
    pub tier: PopularityTier,
}

impl DomainEntry {
    /// Builds an entry, normalizing the host name and deriving the tier.
    ///
    /// Returns `None` for rank 0 or a host name that cannot be normalized.
    pub fn new(rank: u64, raw_hostname: &str, boundaries: &TierBoundaries) -> Option<Self> {
        if rank == 0 {
            return None;
        }
        let hostname = normalize_hostname(raw_hostname)?;
        Some(Self {
            rank,
            hostname,
            tier: boundaries.classify(rank),
        })
    }

    /// URL of the site root over `scheme`.
    pub fn root_url(&self, scheme: &str) -> String {
        format!("{scheme}://{}/", self.hostname)
    }
}

/// Normalizes a raw host name from the input list.
///
/// Lower-cases, strips any scheme, path, query, fragment and trailing dot, and
/// validates the result with the URL parser. An explicit port is kept (useful
/// for local test servers). Returns `None` for anything that is not a host.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if authority.is_empty() || authority.contains('@') || authority.contains(char::is_whitespace)
    {
        return None;
    }

    let parsed = url::Url::parse(&format!("http://{authority}/")).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.');
    if host.is_empty() || host.len() > MAX_HOSTNAME_LENGTH {
        return None;
    }
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

/// Host part of a normalized host name, without port or IPv6 brackets.
pub fn host_without_port(hostname: &str) -> Option<String> {
    let parsed = url::Url::parse(&format!("http://{hostname}/")).ok()?;
    match parsed.host()? {
        url::Host::Domain(domain) => Some(domain.to_string()),
        url::Host::Ipv4(ip) => Some(ip.to_string()),
        url::Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

/// True when the host is an IPv4 or IPv6 literal.
pub fn is_ip_literal(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}

/// Registrable domain (eTLD+1) of a host, per the Public Suffix List.
///
/// IP literals and hosts the list cannot split (single labels such as
/// `localhost`) are returned unchanged, so two such hosts compare equal only
/// when they are identical.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if is_ip_literal(&host) {
        return host;
    }
    match psl::domain_str(&host) {
        Some(domain) => domain.to_string(),
        None => {
            if host.contains('.') {
                warn!("No registrable domain found for host {host}");
            }
            host
        }
    }
}

/// True when both hosts share a registrable domain.
pub fn same_site(a: &str, b: &str) -> bool {
    registrable_domain(a) == registrable_domain(b)
}
