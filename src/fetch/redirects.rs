//! HTTP redirect chain following.
//!
//! Redirects are followed manually with a redirect-disabled client so that
//! every hop is recorded and loops are detected.

use std::collections::BTreeMap;

use log::{debug, warn};
use reqwest::header::LOCATION;
use reqwest::Url;

use super::body::{collect_headers, read_capped_body};
use super::types::FetchStatus;
use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::categorize_fetch_error;

/// Result of following one scheme's redirect chain to its end.
#[derive(Debug)]
pub(crate) struct PageOutcome {
    pub status: FetchStatus,
    pub final_url: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub truncated: bool,
}

impl PageOutcome {
    pub fn failed(status: FetchStatus) -> Self {
        Self {
            status,
            final_url: None,
            headers: BTreeMap::new(),
            body: None,
            truncated: false,
        }
    }

    fn http_error(code: u16, url: &Url, headers: BTreeMap<String, String>) -> Self {
        Self {
            final_url: Some(url.to_string()),
            headers,
            ..Self::failed(FetchStatus::HttpError(code))
        }
    }
}

/// Requests `start_url` and follows redirects up to `max_redirects` hops.
///
/// Every requested URL is appended to `chain`, which the caller owns so the
/// hops survive an outer timeout. Needing one hop more than `max_redirects`,
/// or being sent back to a URL already in `chain`, ends the fetch with
/// `RedirectLoop`. A non-2xx final response yields `HttpError` with its
/// headers kept and its body discarded.
pub(crate) async fn follow_redirects(
    client: &reqwest::Client,
    start_url: Url,
    max_redirects: usize,
    chain: &mut Vec<String>,
) -> PageOutcome {
    let mut current = start_url;
    let mut hops = 0usize;

    loop {
        if chain.iter().any(|visited| visited == current.as_str()) {
            debug!("Redirect revisits {current}");
            return PageOutcome::failed(FetchStatus::RedirectLoop);
        }
        chain.push(current.to_string());

        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let status = categorize_fetch_error(&e);
                debug!("Request to {current} failed ({status}): {e}");
                return PageOutcome::failed(status);
            }
        };

        let status = response.status();
        if status.is_redirection() {
            if let Some(location) = response.headers().get(LOCATION) {
                if hops >= max_redirects {
                    debug!("Redirect limit ({max_redirects}) reached at {current}");
                    return PageOutcome::failed(FetchStatus::RedirectLoop);
                }
                let location = String::from_utf8_lossy(location.as_bytes()).into_owned();
                match current.join(location.trim()) {
                    Ok(next) => {
                        hops += 1;
                        current = next;
                        continue;
                    }
                    Err(e) => {
                        warn!("Unusable Location {location:?} from {current}: {e}");
                        return PageOutcome::http_error(
                            status.as_u16(),
                            &current,
                            collect_headers(response.headers()),
                        );
                    }
                }
            }
        }

        let headers = collect_headers(response.headers());
        if !status.is_success() {
            return PageOutcome::http_error(status.as_u16(), &current, headers);
        }

        return match read_capped_body(response, MAX_RESPONSE_BODY_SIZE).await {
            Ok((body, truncated)) => PageOutcome {
                status: FetchStatus::Ok,
                final_url: Some(current.to_string()),
                headers,
                body: Some(body),
                truncated,
            },
            Err(e) => {
                let status = categorize_fetch_error(&e);
                debug!("Reading body of {current} failed ({status}): {e}");
                PageOutcome::failed(status)
            }
        };
    }
}
