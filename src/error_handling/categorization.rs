//! Error categorization and retry strategy.
//!
//! This module maps `reqwest` failures onto fetch statuses, fetch statuses onto
//! statistics categories, and builds the retry backoff schedule.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::stats::ProcessingStats;
use super::types::ErrorType;
use crate::fetch::FetchStatus;

/// Lower-cased fragments that identify TLS failures in error messages.
const TLS_MARKERS: &[&str] = &[
    "tls",
    "ssl",
    "certificate",
    "handshake",
    "corrupt message",
    "invalidcontenttype",
];

/// Lower-cased fragments that identify name-resolution failures.
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
    "no record found",
];

/// Creates the exponential backoff schedule used between fetch attempts.
///
/// Yields `base, 2*base, 4*base, ...`, each delay capped at `max`.
/// `ExponentialBackoff` with a base of 2 yields `factor * 2^(n+1)`, so the
/// schedule runs at twice the configured delays and is halved on the way out.
/// Halving a `Duration` is exact, so odd millisecond bases are kept as given.
///
/// # Arguments
///
/// * `base` - First delay
/// * `max` - Upper bound for any single delay
pub fn get_retry_strategy(base: Duration, max: Duration) -> impl Iterator<Item = Duration> {
    let factor = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    ExponentialBackoff::from_millis(2)
        .factor(factor)
        .max_delay(max.saturating_mul(2))
        .map(|delay| delay / 2)
}

/// Categorizes a `reqwest::Error` into a `FetchStatus`.
///
/// Timeouts and HTTP statuses are read from `reqwest`'s own flags. TLS and DNS
/// failures are recognised by walking the source chain: a `rustls::Error` found
/// anywhere (including inside an `io::Error` payload) marks a TLS failure, and
/// the lower-level messages are matched against known fragments. Everything
/// else that prevented a response (refused, reset, closed) is a connect failure.
///
/// The top-level message is skipped for string matching because it embeds the
/// request URL, and a host such as `ssl.example.com` must not read as a TLS error.
pub fn categorize_fetch_error(error: &reqwest::Error) -> FetchStatus {
    if error.is_timeout() {
        return FetchStatus::Timeout;
    }
    if let Some(status) = error.status() {
        return FetchStatus::HttpError(status.as_u16());
    }
    if error.is_redirect() {
        return FetchStatus::RedirectLoop;
    }
    if is_tls_error(error) {
        return FetchStatus::TlsFail;
    }
    if chain_contains(error, DNS_MARKERS) {
        return FetchStatus::DnsFail;
    }
    FetchStatus::ConnectFail
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        if cause.is::<rustls::Error>() {
            return true;
        }
        // io::Error::source() skips its custom payload, so look at it directly
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return true;
            }
        }
        source = cause.source();
    }
    chain_contains(error, TLS_MARKERS)
}

fn chain_contains(error: &reqwest::Error, markers: &[&str]) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let message = cause.to_string().to_lowercase();
        if markers.iter().any(|m| message.contains(m)) {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Maps a failed fetch status onto its statistics category.
///
/// Returns `None` for `Ok`.
pub fn error_type_for_status(status: FetchStatus) -> Option<ErrorType> {
    match status {
        FetchStatus::Ok => None,
        FetchStatus::Timeout => Some(ErrorType::FetchTimeout),
        FetchStatus::DnsFail => Some(ErrorType::DnsFailure),
        FetchStatus::TlsFail => Some(ErrorType::TlsFailure),
        FetchStatus::ConnectFail => Some(ErrorType::ConnectFailure),
        FetchStatus::HttpError(crate::config::HTTP_STATUS_TOO_MANY_REQUESTS) => {
            Some(ErrorType::HttpTooManyRequests)
        }
        FetchStatus::HttpError(code) if (500..600).contains(&code) => {
            Some(ErrorType::HttpServerError)
        }
        FetchStatus::HttpError(_) => Some(ErrorType::HttpClientError),
        FetchStatus::RedirectLoop => Some(ErrorType::RedirectLoop),
        FetchStatus::Cancelled => Some(ErrorType::Cancelled),
    }
}

/// Records one fetch attempt's status in the statistics.
pub fn update_error_stats(stats: &ProcessingStats, status: FetchStatus) {
    if let Some(error_type) = error_type_for_status(status) {
        stats.increment_error(error_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_strategy_doubles_from_base() {
        let delays: Vec<_> =
            get_retry_strategy(Duration::from_secs(1), Duration::from_secs(30))
                .take(6)
                .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
                Duration::from_secs(30),
            ]
        );
    }

    #[test]
    fn test_retry_strategy_keeps_odd_base() {
        let delays: Vec<_> =
            get_retry_strategy(Duration::from_millis(1001), Duration::from_millis(5001))
                .take(4)
                .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1001),
                Duration::from_millis(2002),
                Duration::from_millis(4004),
                Duration::from_millis(5001),
            ]
        );
    }

    #[test]
    fn test_retry_strategy_is_non_decreasing() {
        let delays: Vec<_> =
            get_retry_strategy(Duration::from_millis(250), Duration::from_secs(5))
                .take(20)
                .collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(5)));
    }

    #[test]
    fn test_error_type_for_status() {
        assert_eq!(error_type_for_status(FetchStatus::Ok), None);
        assert_eq!(
            error_type_for_status(FetchStatus::HttpError(429)),
            Some(ErrorType::HttpTooManyRequests)
        );
        assert_eq!(
            error_type_for_status(FetchStatus::HttpError(503)),
            Some(ErrorType::HttpServerError)
        );
        assert_eq!(
            error_type_for_status(FetchStatus::HttpError(404)),
            Some(ErrorType::HttpClientError)
        );
        assert_eq!(
            error_type_for_status(FetchStatus::DnsFail),
            Some(ErrorType::DnsFailure)
        );
    }

    #[tokio::test]
    async fn test_categorize_refused_connection() {
        // Bind and immediately release a port so nothing listens on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let client = reqwest::Client::new();
        let error = client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .expect_err("nothing listens on the port");
        assert_eq!(categorize_fetch_error(&error), FetchStatus::ConnectFail);
    }

    #[tokio::test]
    async fn test_categorize_tls_against_plain_http() {
        crate::initialization::init_crypto_provider();
        let server = httptest::Server::run();
        let client = reqwest::Client::new();
        let error = client
            .get(format!("https://{}/", server.addr()))
            .send()
            .await
            .expect_err("plain HTTP server cannot complete a TLS handshake");
        assert_eq!(categorize_fetch_error(&error), FetchStatus::TlsFail);
    }
}
