//! HTTP Range request parsing module
//!
//! Parses a Range header against a known total size into a validated,
//! clamped set of byte ranges.

/// One accepted byte range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes the range covers; never zero since start <= end
    pub const fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this range
    pub fn content_range(&self, unit: &str, total_size: u64) -> String {
        format!("{unit} {}-{}/{total_size}", self.start, self.end)
    }
}

/// Validated set of ranges from a single Range header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    /// Range unit token from before the `=`, echoed in `Accept-Ranges`
    pub unit: String,
    /// Accepted ranges in encounter order; never empty
    pub ranges: Vec<ByteRange>,
}

impl RangeSpec {
    /// The range used to build the response; only the first accepted range
    /// is served even when several were requested.
    pub fn first(&self) -> ByteRange {
        self.ranges[0]
    }
}

/// Range header parse result
#[derive(Debug)]
pub enum RangeParse {
    /// No header, or a malformed-but-ignorable one; serve the whole file
    NoHeader,
    /// Every candidate sub-range was invalid; respond 416
    Unsatisfiable,
    /// At least one valid sub-range
    Ranges(RangeSpec),
}

/// Parse an HTTP Range header value against the total file size.
///
/// Supported sub-range forms, comma-separated after the unit:
/// - `start-end` — clamped to the file end
/// - `start-` — open range, through the file end
/// - `-suffix` — the last `suffix` bytes
///
/// A header without `=` is treated as absent rather than an error.
///
/// # Examples
/// ```
/// use rustatic::http::range::{parse, RangeParse};
///
/// let RangeParse::Ranges(spec) = parse(Some("bytes=0-99"), 1000) else {
///     panic!("expected ranges");
/// };
/// assert_eq!(spec.first().byte_len(), 100);
///
/// assert!(matches!(parse(None, 1000), RangeParse::NoHeader));
/// ```
pub fn parse(header: Option<&str>, total_size: u64) -> RangeParse {
    let Some(header) = header else {
        return RangeParse::NoHeader;
    };
    let Some(eq) = header.find('=') else {
        return RangeParse::NoHeader;
    };

    let unit = header[..eq].to_string();
    // Signed arithmetic keeps oversized suffixes and empty files on the
    // reject path instead of wrapping.
    let total = i64::try_from(total_size).unwrap_or(i64::MAX);

    let mut ranges = Vec::new();
    for candidate in header[eq + 1..].split(',') {
        let parts: Vec<&str> = candidate.split('-').collect();
        let start = parts
            .first()
            .and_then(|s| s.trim().parse::<i64>().ok());
        let end = parts.get(1).and_then(|s| s.trim().parse::<i64>().ok());

        let (start, end) = match (start, end) {
            // Suffix range: the last `suffix` bytes of the file
            (None, Some(suffix)) => (total - suffix, total - 1),
            // Open range: from start through the end of the file
            (Some(s), None) => (s, total - 1),
            (Some(s), Some(e)) => (s, e),
            (None, None) => continue,
        };
        let end = end.min(total - 1);

        if start >= 0 && start <= end {
            #[allow(clippy::cast_sign_loss)]
            ranges.push(ByteRange {
                start: start as u64,
                end: end as u64,
            });
        }
    }

    if ranges.is_empty() {
        return RangeParse::Unsatisfiable;
    }
    RangeParse::Ranges(RangeSpec { unit, ranges })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(header: &str, size: u64) -> ByteRange {
        match parse(Some(header), size) {
            RangeParse::Ranges(spec) => spec.first(),
            other => panic!("expected ranges, got {other:?}"),
        }
    }

    #[test]
    fn test_no_header() {
        assert!(matches!(parse(None, 100), RangeParse::NoHeader));
    }

    #[test]
    fn test_missing_separator_is_ignorable() {
        assert!(matches!(parse(Some("bytes 0-99"), 100), RangeParse::NoHeader));
    }

    #[test]
    fn test_standard_range() {
        let r = first("bytes=0-9", 100);
        assert_eq!(r, ByteRange { start: 0, end: 9 });
        assert_eq!(r.byte_len(), 10);
    }

    #[test]
    fn test_open_range_covers_whole_file() {
        let r = first("bytes=0-", 100);
        assert_eq!(r, ByteRange { start: 0, end: 99 });
        assert_eq!(r.byte_len(), 100);
    }

    #[test]
    fn test_open_range_from_offset() {
        let r = first("bytes=50-", 100);
        assert_eq!(r, ByteRange { start: 50, end: 99 });
    }

    #[test]
    fn test_suffix_range() {
        let r = first("bytes=-20", 100);
        assert_eq!(r, ByteRange { start: 80, end: 99 });
    }

    #[test]
    fn test_suffix_larger_than_file_rejected() {
        assert!(matches!(
            parse(Some("bytes=-200"), 100),
            RangeParse::Unsatisfiable
        ));
    }

    #[test]
    fn test_end_clamped_to_size() {
        let r = first("bytes=90-500", 100);
        assert_eq!(r, ByteRange { start: 90, end: 99 });
    }

    #[test]
    fn test_inverted_range_unsatisfiable() {
        assert!(matches!(
            parse(Some("bytes=500-400"), 100),
            RangeParse::Unsatisfiable
        ));
    }

    #[test]
    fn test_start_past_end_of_file_unsatisfiable() {
        assert!(matches!(
            parse(Some("bytes=200-"), 100),
            RangeParse::Unsatisfiable
        ));
    }

    #[test]
    fn test_garbage_pairs_unsatisfiable() {
        assert!(matches!(
            parse(Some("bytes=a-b"), 100),
            RangeParse::Unsatisfiable
        ));
    }

    #[test]
    fn test_empty_file_never_satisfiable() {
        assert!(matches!(
            parse(Some("bytes=0-"), 0),
            RangeParse::Unsatisfiable
        ));
    }

    #[test]
    fn test_multi_range_keeps_encounter_order() {
        match parse(Some("bytes=10-19,0-4"), 100) {
            RangeParse::Ranges(spec) => {
                assert_eq!(spec.ranges.len(), 2);
                assert_eq!(spec.first(), ByteRange { start: 10, end: 19 });
            }
            other => panic!("expected ranges, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_range_skips_invalid_members() {
        match parse(Some("bytes=500-400,20-29"), 100) {
            RangeParse::Ranges(spec) => {
                assert_eq!(spec.ranges, vec![ByteRange { start: 20, end: 29 }]);
            }
            other => panic!("expected ranges, got {other:?}"),
        }
    }

    #[test]
    fn test_unit_token_preserved() {
        match parse(Some("items=0-1"), 100) {
            RangeParse::Ranges(spec) => assert_eq!(spec.unit, "items"),
            other => panic!("expected ranges, got {other:?}"),
        }
    }

    #[test]
    fn test_content_range_header() {
        let r = first("bytes=10-19", 100);
        assert_eq!(r.content_range("bytes", 100), "bytes 10-19/100");
    }
}
