//! Fetch outcome types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::config::HTTP_STATUS_TOO_MANY_REQUESTS;
use crate::domain::DomainEntry;

/// Outcome classification of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Ok,
    Timeout,
    DnsFail,
    TlsFail,
    /// Connection refused, reset, or closed before a response arrived.
    ConnectFail,
    /// The final response had a non-2xx status.
    HttpError(u16),
    /// More than the allowed redirect hops, or a URL visited twice.
    RedirectLoop,
    /// The sweep was cancelled before the fetch could finish.
    Cancelled,
}

impl FetchStatus {
    /// Status name without the HTTP code, as written to the `fetch_status` column.
    pub fn code(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "OK",
            FetchStatus::Timeout => "TIMEOUT",
            FetchStatus::DnsFail => "DNS_FAIL",
            FetchStatus::TlsFail => "TLS_FAIL",
            FetchStatus::ConnectFail => "CONNECT_FAIL",
            FetchStatus::HttpError(_) => "HTTP_ERROR",
            FetchStatus::RedirectLoop => "REDIRECT_LOOP",
            FetchStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchStatus::HttpError(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FetchStatus::Ok)
    }

    /// Transient failures may succeed on a later attempt: timeouts, refused or
    /// reset connections, 429, and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchStatus::Timeout | FetchStatus::ConnectFail => true,
            FetchStatus::HttpError(code) => {
                *code == HTTP_STATUS_TOO_MANY_REQUESTS || (500..600).contains(code)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::HttpError(code) => write!(f, "HTTP_ERROR({code})"),
            other => f.write_str(other.code()),
        }
    }
}

impl Serialize for FetchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One scheme tried during a fetch and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeAttempt {
    pub scheme: &'static str,
    pub status: FetchStatus,
}

/// Everything the fetcher learned about one domain.
///
/// `raw_content` is present only when `status` is `Ok`. Header names are
/// lower-case and the map is ordered, so two fetches of the same response
/// compare equal.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub domain: DomainEntry,
    pub status: FetchStatus,
    pub raw_content: Option<Vec<u8>>,
    pub final_url: Option<String>,
    pub response_headers: BTreeMap<String, String>,
    pub elapsed_ms: u64,
    /// Every URL requested, in order, across all schemes.
    pub redirect_chain: Vec<String>,
    pub scheme_attempts: Vec<SchemeAttempt>,
    pub body_truncated: bool,
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// A result carrying only a failure status.
    pub fn failed(domain: DomainEntry, status: FetchStatus, elapsed_ms: u64) -> Self {
        Self {
            domain,
            status,
            raw_content: None,
            final_url: None,
            response_headers: BTreeMap::new(),
            elapsed_ms,
            redirect_chain: Vec::new(),
            scheme_attempts: Vec::new(),
            body_truncated: false,
            fetched_at: Utc::now(),
        }
    }

    /// The result recorded for a domain the sweep never got to finish.
    pub fn cancelled(domain: DomainEntry) -> Self {
        Self::failed(domain, FetchStatus::Cancelled, 0)
    }

    /// Number of redirects followed (requests minus the scheme starts).
    pub fn redirect_count(&self) -> usize {
        self.redirect_chain
            .len()
            .saturating_sub(self.scheme_attempts.len().max(1))
    }

    /// True when HTTPS failed at the TLS layer and the page was retried over HTTP.
    pub fn fell_back_to_http(&self) -> bool {
        self.scheme_attempts.len() > 1
            && self
                .scheme_attempts
                .first()
                .is_some_and(|a| a.status == FetchStatus::TlsFail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(FetchStatus::Timeout.is_transient());
        assert!(FetchStatus::ConnectFail.is_transient());
        assert!(FetchStatus::HttpError(429).is_transient());
        assert!(FetchStatus::HttpError(503).is_transient());
        assert!(FetchStatus::HttpError(500).is_transient());
        assert!(!FetchStatus::HttpError(404).is_transient());
        assert!(!FetchStatus::HttpError(403).is_transient());
        assert!(!FetchStatus::DnsFail.is_transient());
        assert!(!FetchStatus::TlsFail.is_transient());
        assert!(!FetchStatus::RedirectLoop.is_transient());
        assert!(!FetchStatus::Cancelled.is_transient());
        assert!(!FetchStatus::Ok.is_transient());
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(FetchStatus::HttpError(404).to_string(), "HTTP_ERROR(404)");
        assert_eq!(FetchStatus::DnsFail.to_string(), "DNS_FAIL");
        assert_eq!(
            serde_json::to_string(&FetchStatus::RedirectLoop).expect("json"),
            "\"REDIRECT_LOOP\""
        );
    }

    #[test]
    fn test_http_status_only_for_http_errors() {
        assert_eq!(FetchStatus::HttpError(503).http_status(), Some(503));
        assert_eq!(FetchStatus::Timeout.http_status(), None);
    }
}
