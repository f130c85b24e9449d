//! Page fetching.
//!
//! `PageFetcher` is the seam between the orchestrator and the network: the
//! sweep only ever sees a `FetchResult`, never an error. `HttpFetcher` is the
//! `reqwest` implementation; tests substitute their own.

mod body;
mod redirects;
mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::error::ProtoErrorKind;
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use reqwest::Url;
use tokio::time::Instant;

use crate::config::Config;
use crate::domain::{host_without_port, is_ip_literal, DomainEntry};
use redirects::{follow_redirects, PageOutcome};

pub use body::collect_headers;
pub use types::{FetchResult, FetchStatus, SchemeAttempt};

/// Fetches the root page of a domain.
///
/// Implementations must never panic and never return an error: every failure
/// is expressed as a `FetchStatus`. Retries are the caller's business.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, domain: &DomainEntry) -> FetchResult;
}

/// Fetch behaviour knobs taken from `Config`.
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Budget for the whole fetch, every scheme and hop included
    pub total_timeout: Duration,
    pub max_redirects: usize,
    /// Try HTTPS first and fall back to HTTP on a TLS failure
    pub https_first: bool,
}

impl From<&Config> for FetcherOptions {
    fn from(config: &Config) -> Self {
        Self {
            total_timeout: Duration::from_secs(config.timeout_seconds),
            max_redirects: config.max_redirects,
            https_first: config.https_first,
        }
    }
}

/// Network fetcher over a redirect-disabled `reqwest::Client`.
///
/// When a resolver is supplied, host names are resolved before any request so
/// that resolution failures are classified as `DnsFail` regardless of how the
/// HTTP stack words them.
pub struct HttpFetcher {
    client: Arc<reqwest::Client>,
    resolver: Option<Arc<TokioAsyncResolver>>,
    options: FetcherOptions,
}

impl HttpFetcher {
    pub fn new(
        client: Arc<reqwest::Client>,
        resolver: Option<Arc<TokioAsyncResolver>>,
        options: FetcherOptions,
    ) -> Self {
        Self {
            client,
            resolver,
            options,
        }
    }

    fn schemes(&self) -> &'static [&'static str] {
        if self.options.https_first {
            &["https", "http"]
        } else {
            &["http"]
        }
    }

    /// Returns the failure status when the host cannot be resolved.
    async fn check_resolution(&self, hostname: &str) -> Option<FetchStatus> {
        let resolver = self.resolver.as_ref()?;
        let Some(host) = host_without_port(hostname) else {
            return Some(FetchStatus::DnsFail);
        };
        if is_ip_literal(&host) {
            return None;
        }
        match resolver.lookup_ip(host.as_str()).await {
            Ok(lookup) if lookup.iter().next().is_some() => None,
            Ok(_) => {
                debug!("{host} resolved to no addresses");
                Some(FetchStatus::DnsFail)
            }
            Err(e) => {
                let status = resolve_error_status(&e);
                debug!("DNS lookup for {host} failed ({status}): {e}");
                Some(status)
            }
        }
    }

    /// Tries each scheme in turn, moving on only after a TLS failure.
    async fn fetch_schemes(
        &self,
        domain: &DomainEntry,
        attempts: &mut Vec<SchemeAttempt>,
        chain: &mut Vec<String>,
    ) -> PageOutcome {
        let schemes = self.schemes();
        for (index, &scheme) in schemes.iter().enumerate() {
            let start = match Url::parse(&domain.root_url(scheme)) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Cannot build URL for {}: {e}", domain.hostname);
                    return PageOutcome::failed(FetchStatus::DnsFail);
                }
            };
            let outcome =
                follow_redirects(&self.client, start, self.options.max_redirects, chain).await;
            attempts.push(SchemeAttempt {
                scheme,
                status: outcome.status,
            });
            let has_fallback = index + 1 < schemes.len();
            if outcome.status == FetchStatus::TlsFail && has_fallback {
                debug!("TLS failed for {}, retrying over HTTP", domain.hostname);
                continue;
            }
            return outcome;
        }
        PageOutcome::failed(FetchStatus::ConnectFail)
    }
}

/// Status for a failed lookup.
///
/// A name server that never answered, or could not be reached, says nothing
/// about the name, so those are transient. Any answer (NXDOMAIN, no address
/// records, a malformed reply) is a `DnsFail`.
pub(crate) fn resolve_error_status(error: &ResolveError) -> FetchStatus {
    match error.kind() {
        ResolveErrorKind::Timeout | ResolveErrorKind::NoConnections => FetchStatus::Timeout,
        ResolveErrorKind::Io(_) => FetchStatus::ConnectFail,
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::Timeout => FetchStatus::Timeout,
            ProtoErrorKind::Io(_) => FetchStatus::ConnectFail,
            _ => FetchStatus::DnsFail,
        },
        _ => FetchStatus::DnsFail,
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, domain: &DomainEntry) -> FetchResult {
        let started = Instant::now();
        let fetched_at = Utc::now();
        let elapsed_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut attempts = Vec::new();
        let mut chain = Vec::new();
        let mut resolved = false;
        let timed = tokio::time::timeout(self.options.total_timeout, async {
            if let Some(status) = self.check_resolution(&domain.hostname).await {
                return PageOutcome::failed(status);
            }
            resolved = true;
            self.fetch_schemes(domain, &mut attempts, &mut chain).await
        })
        .await;
        let outcome = match timed {
            Ok(outcome) => outcome,
            Err(_) => {
                // The scheme in flight never recorded its attempt
                if resolved {
                    let scheme = self
                        .schemes()
                        .get(attempts.len())
                        .copied()
                        .unwrap_or("http");
                    attempts.push(SchemeAttempt {
                        scheme,
                        status: FetchStatus::Timeout,
                    });
                }
                PageOutcome::failed(FetchStatus::Timeout)
            }
        };

        FetchResult {
            domain: domain.clone(),
            status: outcome.status,
            raw_content: outcome.body,
            final_url: outcome.final_url,
            response_headers: outcome.headers,
            elapsed_ms: elapsed_ms(),
            redirect_chain: chain,
            scheme_attempts: attempts,
            body_truncated: outcome.truncated,
            fetched_at,
        }
    }
}
