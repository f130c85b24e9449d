//! Response header and body capture with size limits.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;

use crate::config::{MAX_HEADER_COUNT, MAX_HEADER_VALUE_LENGTH};

/// Copies response headers into an ordered map with lower-case names.
///
/// Repeated headers are joined with `", "`. At most `MAX_HEADER_COUNT` distinct
/// names are kept and each value is cut at `MAX_HEADER_VALUE_LENGTH` characters,
/// so a hostile server cannot bloat the dataset through its headers.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        if !collected.contains_key(&key) && collected.len() >= MAX_HEADER_COUNT {
            continue;
        }
        let value = String::from_utf8_lossy(value.as_bytes());
        let entry = collected.entry(key).or_default();
        if !entry.is_empty() {
            entry.push_str(", ");
        }
        entry.push_str(&value);
        if entry.chars().count() > MAX_HEADER_VALUE_LENGTH {
            *entry = entry.chars().take(MAX_HEADER_VALUE_LENGTH).collect();
        }
    }
    collected
}

/// Reads a response body, keeping at most `limit` bytes.
///
/// Returns the bytes kept and whether the body was truncated. Reading stops
/// as soon as the limit is reached.
///
/// # Errors
///
/// Returns the `reqwest::Error` raised while streaming the body (timeout or
/// connection reset).
pub async fn read_capped_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit.saturating_sub(body.len());
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}
