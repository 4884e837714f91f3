//! HTTP cache control module
//!
//! Computes cache headers and an entity tag from file metadata, and decides
//! whether a client's cached copy is still valid.

use crate::config::CacheOption;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Duration substituted when the cache policy is `true`
pub const DEFAULT_MAX_AGE: u64 = 7200;

/// Cache headers attached to a file response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub last_modified: String,
    pub date: String,
    pub expires: String,
    pub cache_control: String,
    /// Present only when entity tags are enabled
    pub etag: Option<String>,
}

/// Map the configured cache policy to an effective max-age in seconds.
///
/// Pure resolution; the stored configuration is never rewritten.
pub const fn effective_max_age(policy: CacheOption) -> Option<u64> {
    match policy {
        CacheOption::Enabled(false) => None,
        CacheOption::Enabled(true) => Some(DEFAULT_MAX_AGE),
        CacheOption::Seconds(secs) => Some(secs),
    }
}

/// Opaque entity tag from file size and modification time, both hex-encoded
///
/// # Examples
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use rustatic::http::cache::entity_tag;
/// let mtime = UNIX_EPOCH + Duration::from_millis(0x1234);
/// assert_eq!(entity_tag(255, mtime), "\"ff-1234\"");
/// ```
pub fn entity_tag(size: u64, mtime: SystemTime) -> String {
    let millis = mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("\"{size:x}-{millis:x}\"")
}

/// Compute cache headers for a file, or None when the policy disables
/// caching.
pub fn evaluate(
    size: u64,
    mtime: SystemTime,
    policy: CacheOption,
    want_etag: bool,
) -> Option<CacheHeaders> {
    let max_age = effective_max_age(policy)?;
    let now = SystemTime::now();
    Some(CacheHeaders {
        last_modified: httpdate::fmt_http_date(mtime),
        date: httpdate::fmt_http_date(now),
        expires: httpdate::fmt_http_date(now + Duration::from_secs(max_age)),
        cache_control: format!("max-age={max_age}"),
        etag: if want_etag {
            Some(entity_tag(size, mtime))
        } else {
            None
        },
    })
}

/// Check the client's `If-None-Match` against the server's entity tag.
/// Accepts comma-separated lists and the `*` wildcard.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .any(|e| e.trim() == etag || e.trim() == "*")
}

/// Check `If-Modified-Since` against the file's modification time.
///
/// HTTP dates carry 1-second resolution, so sub-second differences count as
/// not modified. Returns false for an unparseable header.
pub fn not_modified_since(if_modified_since: &str, mtime: SystemTime) -> bool {
    match httpdate::parse_http_date(if_modified_since) {
        Ok(since) => match mtime.duration_since(since) {
            Ok(delta) => delta.as_secs() < 1,
            Err(_) => true,
        },
        Err(_) => false,
    }
}

/// Decide whether the client's cached copy is still valid.
///
/// The entity tag takes precedence when both the header and the tag exist;
/// otherwise `If-Modified-Since` is consulted.
pub fn is_valid(
    headers: &CacheHeaders,
    mtime: SystemTime,
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
) -> bool {
    if let (Some(tag), Some(inm)) = (headers.etag.as_deref(), if_none_match) {
        return etag_matches(inm, tag);
    }
    if let Some(ims) = if_modified_since {
        return not_modified_since(ims, mtime);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtime_at(millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(millis)
    }

    #[test]
    fn test_effective_max_age() {
        assert_eq!(effective_max_age(CacheOption::Enabled(false)), None);
        assert_eq!(
            effective_max_age(CacheOption::Enabled(true)),
            Some(DEFAULT_MAX_AGE)
        );
        assert_eq!(effective_max_age(CacheOption::Seconds(60)), Some(60));
    }

    #[test]
    fn test_entity_tag_format() {
        let tag = entity_tag(4096, mtime_at(0xabcdef));
        assert_eq!(tag, "\"1000-abcdef\"");
    }

    #[test]
    fn test_evaluate_off_policy_emits_nothing() {
        assert!(evaluate(10, mtime_at(1000), CacheOption::Enabled(false), true).is_none());
    }

    #[test]
    fn test_evaluate_headers() {
        let headers = evaluate(10, mtime_at(1000), CacheOption::Seconds(300), true).unwrap();
        assert_eq!(headers.cache_control, "max-age=300");
        assert!(headers.etag.is_some());
        assert!(headers.last_modified.ends_with("GMT"));
    }

    #[test]
    fn test_evaluate_without_etag() {
        let headers = evaluate(10, mtime_at(1000), CacheOption::Enabled(true), false).unwrap();
        assert_eq!(headers.etag, None);
        assert_eq!(headers.cache_control, "max-age=7200");
    }

    #[test]
    fn test_etag_matches() {
        let tag = "\"a-b\"";
        assert!(etag_matches("\"a-b\"", tag));
        assert!(etag_matches("\"x\", \"a-b\"", tag));
        assert!(etag_matches("*", tag));
        assert!(!etag_matches("\"other\"", tag));
    }

    #[test]
    fn test_not_modified_since() {
        let mtime = mtime_at(1_700_000_000_000);
        let header = httpdate::fmt_http_date(mtime);
        assert!(not_modified_since(&header, mtime));
        // File changed two seconds after the client's copy
        assert!(!not_modified_since(
            &header,
            mtime + Duration::from_secs(2)
        ));
        assert!(!not_modified_since("not a date", mtime));
    }

    #[test]
    fn test_etag_takes_precedence_over_date() {
        let mtime = mtime_at(1_700_000_000_000);
        let headers = evaluate(10, mtime, CacheOption::Enabled(true), true).unwrap();
        let tag = headers.etag.clone().unwrap();
        let ims = httpdate::fmt_http_date(mtime);
        // Tag mismatch wins even though the date would validate
        assert!(!is_valid(&headers, mtime, Some("\"stale\""), Some(&ims)));
        assert!(is_valid(&headers, mtime, Some(&tag), None));
        assert!(is_valid(&headers, mtime, None, Some(&ims)));
        assert!(!is_valid(&headers, mtime, None, None));
    }
}
