//! Signed-URL detection, key extraction, and expiry computation
//!
//! Signed URLs are SigV4 query-parameter URLs: issue time in `X-Amz-Date`,
//! lifetime in `X-Amz-Expires`, plus algorithm and signature markers.
//! Expiry is `issued_at + ttl`; a URL counts as "expiring soon" once it is
//! within a 5-minute safety margin of that instant. Absence of expiry
//! information is never treated as expired.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use url::Url;

/// SigV4 algorithm query parameter.
const PARAM_ALGORITHM: &str = "X-Amz-Algorithm";
/// SigV4 signature query parameter.
const PARAM_SIGNATURE: &str = "X-Amz-Signature";
/// SigV4 issue-time query parameter (`YYYYMMDDTHHMMSSZ`).
const PARAM_DATE: &str = "X-Amz-Date";
/// SigV4 lifetime query parameter, in seconds.
const PARAM_EXPIRES: &str = "X-Amz-Expires";

/// Lead time before actual expiry at which a signed URL is treated as
/// expiring soon and should be proactively refreshed.
pub const SAFETY_MARGIN_SECS: i64 = 5 * 60;

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Whether `input` is a signed URL (carries the SigV4 algorithm and
/// signature query parameters).
#[must_use]
pub fn is_signed_url(input: &str) -> bool {
    Url::parse(input).is_ok_and(|url| {
        query_param(&url, PARAM_ALGORITHM).is_some() && query_param(&url, PARAM_SIGNATURE).is_some()
    })
}

/// Extracts the storage key from a path-style object-store URL
/// (`<endpoint>/<bucket>/<key>?...`).
///
/// Returns `None` when `input` is not a URL, addresses a different
/// bucket, or carries no key after the bucket segment.
#[must_use]
pub fn extract_key(input: &str, bucket: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    let mut segments = url.path_segments()?;
    if segments.next()? != bucket {
        return None;
    }
    let key = segments.collect::<Vec<_>>().join("/");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Expiry instant of a signed URL, when its parameters are present and
/// well-formed.
#[must_use]
pub fn expires_at(input: &str) -> Option<DateTime<Utc>> {
    let url = Url::parse(input).ok()?;
    let issued_at = query_param(&url, PARAM_DATE)
        .and_then(|date| NaiveDateTime::parse_from_str(&date, "%Y%m%dT%H%M%SZ").ok())?
        .and_utc();
    let ttl_secs: i64 = query_param(&url, PARAM_EXPIRES)?.parse().ok()?;
    Some(issued_at + Duration::seconds(ttl_secs))
}

/// Whether the URL is within the safety margin of its expiry at `now`.
///
/// Unsigned URLs and URLs with missing or malformed expiry parameters are
/// `false`: absence of expiry information must never read as "expired."
#[must_use]
pub fn is_expiring_soon_at(input: &str, now: DateTime<Utc>) -> bool {
    expires_at(input)
        .is_some_and(|expiry| now >= expiry - Duration::seconds(SAFETY_MARGIN_SECS))
}

/// [`is_expiring_soon_at`] against the current time.
#[must_use]
pub fn is_expiring_soon(input: &str) -> bool {
    is_expiring_soon_at(input, Utc::now())
}
