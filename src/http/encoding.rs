//! Content-encoding negotiation module
//!
//! Picks a compression encoding from the intersection of server-allowed and
//! client-advertised encodings, in client preference order.

use crate::config::ZipPolicy;
use hyper::header::HeaderValue;
use std::path::Path;

/// Encodings substituted when the compression policy is `true`
const DEFAULT_ENCODINGS: [&str; 2] = ["deflate", "gzip"];

/// File extensions worth compressing; binary and media files are served as-is
const COMPRESSIBLE: [&str; 7] = ["html", "css", "js", "json", "xml", "svg", "txt"];

/// A compression transform this server can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Deflate,
    Gzip,
    Brotli,
}

impl Encoding {
    /// The token used in `Accept-Encoding` and `Content-Encoding`
    pub const fn token(self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
            Self::Brotli => "br",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "deflate" => Some(Self::Deflate),
            "gzip" => Some(Self::Gzip),
            "br" => Some(Self::Brotli),
            _ => None,
        }
    }
}

/// Outcome of content-encoding negotiation.
///
/// `Malformed` means the client's header could not be read as an ordered
/// list; the stream is served unchanged, but callers can tell the case apart
/// from a deliberate no-compression decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingDecision {
    None,
    Selected(Encoding),
    Malformed,
}

/// Resolve the configured policy into the list of allowed encoding names,
/// or None when compression is off.
pub fn allowed_encodings(policy: &ZipPolicy) -> Option<Vec<String>> {
    match policy {
        ZipPolicy::Enabled(false) => None,
        ZipPolicy::Enabled(true) => {
            Some(DEFAULT_ENCODINGS.iter().map(ToString::to_string).collect())
        }
        ZipPolicy::Single(name) => Some(vec![name.clone()]),
        ZipPolicy::List(names) => Some(names.clone()),
    }
}

/// Whether a file of this extension is worth compressing
pub fn is_compressible(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            COMPRESSIBLE.contains(&ext.as_str())
        })
}

/// Parse an Accept-Encoding value into tokens ordered by client preference.
///
/// Entries are weighted by `;q=`, ties keep header order, and `q=0` entries
/// are dropped.
pub fn client_encodings(value: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = Vec::new();
    for part in value.split(',') {
        let mut params = part.split(';');
        let token = params.next().unwrap_or("").trim().to_ascii_lowercase();
        if token.is_empty() {
            continue;
        }
        let quality = params
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        if quality > 0.0 {
            entries.push((token, quality));
        }
    }
    // Stable sort keeps header order for equal weights
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(token, _)| token).collect()
}

/// Negotiate a content encoding for a file.
///
/// The first client-preferred token that appears anywhere in the server's
/// allowed list wins; the allowed list's order never breaks ties. A winning
/// token naming a transform this server lacks falls back to identity.
pub fn negotiate(
    path: &Path,
    accept_encoding: Option<&HeaderValue>,
    policy: &ZipPolicy,
) -> EncodingDecision {
    if !is_compressible(path) {
        return EncodingDecision::None;
    }
    let Some(header) = accept_encoding else {
        return EncodingDecision::None;
    };
    let Ok(header) = header.to_str() else {
        return EncodingDecision::Malformed;
    };
    let Some(allowed) = allowed_encodings(policy) else {
        return EncodingDecision::None;
    };

    for token in client_encodings(header) {
        if allowed.iter().any(|a| a == &token) {
            return match Encoding::from_token(&token) {
                Some(encoding) => EncodingDecision::Selected(encoding),
                None => EncodingDecision::None,
            };
        }
    }
    EncodingDecision::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn test_client_preference_order_wins() {
        let policy = ZipPolicy::List(vec!["gzip".to_string(), "deflate".to_string()]);
        let accept = header("deflate, gzip");
        let decision = negotiate(Path::new("a.html"), Some(&accept), &policy);
        assert_eq!(decision, EncodingDecision::Selected(Encoding::Deflate));
    }

    #[test]
    fn test_quality_reorders_client_list() {
        let policy = ZipPolicy::Enabled(true);
        let accept = header("deflate;q=0.5, gzip");
        let decision = negotiate(Path::new("a.css"), Some(&accept), &policy);
        assert_eq!(decision, EncodingDecision::Selected(Encoding::Gzip));
    }

    #[test]
    fn test_q_zero_drops_encoding() {
        assert_eq!(client_encodings("gzip;q=0, deflate"), vec!["deflate"]);
    }

    #[test]
    fn test_non_compressible_extension_never_wrapped() {
        let policy = ZipPolicy::Enabled(true);
        let accept = header("gzip, deflate");
        assert_eq!(
            negotiate(Path::new("photo.png"), Some(&accept), &policy),
            EncodingDecision::None
        );
    }

    #[test]
    fn test_policy_off() {
        let accept = header("gzip");
        assert_eq!(
            negotiate(Path::new("a.html"), Some(&accept), &ZipPolicy::Enabled(false)),
            EncodingDecision::None
        );
    }

    #[test]
    fn test_single_name_policy() {
        let policy = ZipPolicy::Single("br".to_string());
        let accept = header("gzip, br");
        assert_eq!(
            negotiate(Path::new("a.json"), Some(&accept), &policy),
            EncodingDecision::Selected(Encoding::Brotli)
        );
    }

    #[test]
    fn test_default_list_excludes_brotli() {
        let accept = header("br");
        assert_eq!(
            negotiate(Path::new("a.html"), Some(&accept), &ZipPolicy::Enabled(true)),
            EncodingDecision::None
        );
    }

    #[test]
    fn test_absent_header_means_no_compression() {
        assert_eq!(
            negotiate(Path::new("a.html"), None, &ZipPolicy::Enabled(true)),
            EncodingDecision::None
        );
    }

    #[test]
    fn test_unreadable_header_is_malformed() {
        let bad = HeaderValue::from_bytes(b"gzip\xff").unwrap();
        assert_eq!(
            negotiate(Path::new("a.html"), Some(&bad), &ZipPolicy::Enabled(true)),
            EncodingDecision::Malformed
        );
    }

    #[test]
    fn test_unsupported_allowed_token_falls_back_to_identity() {
        let policy = ZipPolicy::Single("zstd".to_string());
        let accept = header("zstd, gzip");
        assert_eq!(
            negotiate(Path::new("a.html"), Some(&accept), &policy),
            EncodingDecision::None
        );
    }
}
