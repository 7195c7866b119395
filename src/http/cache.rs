//! HTTP cache validation module
//!
//! Stored models are write-once, so size plus modification time identifies a
//! version without hashing megabytes of model data per request.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Weak `ETag` derived from file size and modification time
///
/// Returns e.g. `W/"1a2b-18c3f0e7d21"`.
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let millis = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format!("W/\"{len:x}-{millis:x}\"")
}

/// Format a timestamp as an HTTP date (`Last-Modified`)
pub fn format_http_date(time: SystemTime) -> String {
    let dt: DateTime<Utc> = time.into();
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Uses weak comparison, so `W/"x"` and `"x"` match each other.
/// Supports a list of tags and the `*` wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = etag.trim_start_matches("W/");
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e.trim_start_matches("W/") == ours
        })
    })
}
