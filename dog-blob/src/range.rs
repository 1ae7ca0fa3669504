//! `Range` header parsing and clamping.
//!
//! Only single `bytes=` ranges are understood. Anything else (absent,
//! malformed, multi-range, unparsable numbers) resolves to the default
//! window `[0, min(chunk_size, size) - 1]` rather than failing the request.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CHUNK_SIZE;

/// Inclusive byte window resolved against a known object size.
///
/// Always satisfies `start <= end < total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_full_content(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total_size
    }

    /// Value for the `Content-Range` header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// A syntactically valid single byte-range spec, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=N-M`
    Bounded { first: u64, last: u64 },
    /// `bytes=N-`
    From { first: u64 },
    /// `bytes=-M`, the final M bytes
    Suffix { length: u64 },
}

impl RangeSpec {
    /// Parse a raw header value. `None` means "not a range we serve".
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }

        let (first, last) = spec.split_once('-')?;
        if last.contains('-') {
            return None;
        }

        let (first, last) = (first.trim(), last.trim());
        match (first.is_empty(), last.is_empty()) {
            (true, true) => None,
            (true, false) => Some(Self::Suffix {
                length: parse_offset(last)?,
            }),
            (false, true) => Some(Self::From {
                first: parse_offset(first)?,
            }),
            (false, false) => Some(Self::Bounded {
                first: parse_offset(first)?,
                last: parse_offset(last)?,
            }),
        }
    }
}

// Digits only: rejects signs, whitespace inside the number and overflow.
fn parse_offset(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok()
}

/// Resolves `Range` headers into byte windows.
#[derive(Debug, Clone, Copy)]
pub struct RangeParser {
    chunk_size: u64,
}

impl Default for RangeParser {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl RangeParser {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Window served when no usable range was requested.
    pub fn default_window(&self, total_size: u64) -> Option<ResolvedRange> {
        let last = total_size.checked_sub(1)?;
        Some(ResolvedRange {
            start: 0,
            end: (self.chunk_size - 1).min(last),
            total_size,
        })
    }

    /// Resolve `header` against `total_size`.
    ///
    /// Returns `None` only for empty objects, which have no byte window.
    pub fn resolve(&self, header: Option<&str>, total_size: u64) -> Option<ResolvedRange> {
        let last = total_size.checked_sub(1)?;

        let Some(spec) = header.and_then(RangeSpec::parse) else {
            return self.default_window(total_size);
        };

        let (start, end) = match spec {
            RangeSpec::Bounded { first, last: want } => {
                let start = first.min(last);
                (start, want.min(last).max(start))
            }
            RangeSpec::From { first } => {
                let want = first.saturating_add(self.chunk_size - 1);
                let start = first.min(last);
                (start, want.min(last).max(start))
            }
            RangeSpec::Suffix { length: 0 } => return self.default_window(total_size),
            RangeSpec::Suffix { length } => (total_size - length.min(total_size), last),
        };

        Some(ResolvedRange {
            start,
            end,
            total_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MB: u64 = 1_048_576;

    fn window(header: Option<&str>, size: u64) -> (u64, u64) {
        let r = RangeParser::default().resolve(header, size).unwrap();
        (r.start, r.end)
    }

    #[test]
    fn absent_header_uses_default_window() {
        assert_eq!(window(None, 10_000_000), (0, MB - 1));
        assert_eq!(window(None, 500), (0, 499));
    }

    #[test]
    fn bounded_range_is_served_as_asked() {
        assert_eq!(window(Some("bytes=0-1048575"), 10_000_000), (0, 1_048_575));
        assert_eq!(window(Some("bytes=100-199"), 500), (100, 199));
    }

    #[test]
    fn open_ended_range_is_capped_to_one_chunk() {
        assert_eq!(window(Some("bytes=1000-"), 10_000_000), (1000, 1000 + MB - 1));
        assert_eq!(window(Some("bytes=400-"), 500), (400, 499));
    }

    #[test]
    fn large_explicit_range_is_not_recapped() {
        assert_eq!(window(Some("bytes=0-50000000"), 100_000_000), (0, 50_000_000));
    }

    #[test]
    fn end_past_size_is_clamped() {
        assert_eq!(window(Some("bytes=10-99999"), 500), (10, 499));
    }

    #[test]
    fn start_past_size_clamps_to_last_byte() {
        assert_eq!(window(Some("bytes=600-700"), 500), (499, 499));
        assert_eq!(window(Some("bytes=600-"), 500), (499, 499));
    }

    #[test]
    fn end_below_start_is_raised_to_start() {
        assert_eq!(window(Some("bytes=300-100"), 500), (300, 300));
    }

    #[test]
    fn suffix_range_serves_the_tail() {
        assert_eq!(window(Some("bytes=-100"), 500), (400, 499));
        assert_eq!(window(Some("bytes=-9999"), 500), (0, 499));
        assert_eq!(window(Some("bytes=-0"), 500), (0, 499));
    }

    #[test]
    fn malformed_headers_fall_back() {
        for header in [
            "",
            "bytes=",
            "bytes=-",
            "items=0-10",
            "bytes=abc-def",
            "bytes=0-10,20-30",
            "bytes=-5-10",
            "bytes=+5-10",
            "bytes=99999999999999999999999-",
            "bytes 0-10",
        ] {
            assert_eq!(window(Some(header), 10_000_000), (0, MB - 1), "{header}");
        }
    }

    #[test]
    fn whitespace_around_offsets_is_tolerated() {
        assert_eq!(window(Some("  bytes= 5 - 9 "), 500), (5, 9));
    }

    #[test]
    fn empty_object_has_no_window() {
        assert!(RangeParser::default().resolve(None, 0).is_none());
        assert!(RangeParser::default().resolve(Some("bytes=0-10"), 0).is_none());
    }

    #[test]
    fn resolved_range_headers() {
        let r = RangeParser::default()
            .resolve(Some("bytes=0-1048575"), 10_000_000)
            .unwrap();
        assert_eq!(r.content_length(), MB);
        assert_eq!(r.content_range(), "bytes 0-1048575/10000000");
        assert!(!r.is_full_content());

        let full = RangeParser::default().resolve(None, 500).unwrap();
        assert!(full.is_full_content());
        assert_eq!(full.content_length(), 500);
    }

    #[test]
    fn custom_chunk_size_drives_default_window() {
        let parser = RangeParser::new(10);
        assert_eq!(parser.resolve(None, 500).map(|r| r.end), Some(9));
        assert_eq!(parser.resolve(Some("bytes=20-"), 500).map(|r| r.end), Some(29));
    }

    proptest! {
        #[test]
        fn valid_ranges_are_returned_unclamped(
            size in 1u64..u64::MAX / 2,
            a in any::<u64>(),
            b in any::<u64>(),
        ) {
            let (x, y) = (a % size, b % size);
            let (start, end) = (x.min(y), x.max(y));
            let header = format!("bytes={start}-{end}");
            prop_assert_eq!(window(Some(&header), size), (start, end));
        }

        #[test]
        fn garbage_resolves_to_default_window(
            size in 1u64..1_000_000_000,
            junk in "[a-z ,;=]{0,24}",
        ) {
            prop_assert_eq!(window(Some(&junk), size), (0, (MB - 1).min(size - 1)));
        }

        #[test]
        fn start_beyond_size_stays_in_bounds(
            size in 1u64..1_000_000,
            over in 0u64..1_000_000,
            end in any::<Option<u64>>(),
        ) {
            let start = size + over;
            let header = match end {
                Some(end) => format!("bytes={start}-{end}"),
                None => format!("bytes={start}-"),
            };
            let (s, e) = window(Some(&header), size);
            prop_assert_eq!(s, size - 1);
            prop_assert!(e >= s && e < size);
        }
    }
}
