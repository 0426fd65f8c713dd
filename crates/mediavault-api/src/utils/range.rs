//! HTTP Range header evaluation for streaming endpoints.
//!
//! Only single `bytes=start-end` ranges are honored. Anything the parser
//! does not understand (other units, suffix ranges, multiple ranges, garbage)
//! is treated as if no Range header was sent, so the client gets the full
//! body with a 200. A syntactically valid range that starts at or past the
//! end of the object is unsatisfiable and must produce a 416 with
//! `Content-Range: bytes */{total}`.

/// Outcome of evaluating a request's Range header against an object size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable range: respond 200 with the full body and Content-Length
    Full,
    /// Satisfiable range: respond 206 with `Content-Range: bytes start-end/total`
    Partial { start: u64, end: u64 },
    /// Range starts past the end: respond 416 with `Content-Range: bytes */total`
    Unsatisfiable,
}

/// Parse `bytes=start-end` or `bytes=start-`. Returns `(start, Option<end>)`,
/// or `None` for anything else.
fn parse_single_byte_range(header: &str) -> Option<(u64, Option<u64>)> {
    let spec = header.strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }
    let (start_str, end_str) = spec.split_once('-')?;
    let start: u64 = start_str.trim().parse().ok()?;
    let end_str = end_str.trim();
    if end_str.is_empty() {
        return Some((start, None));
    }
    let end: u64 = end_str.parse().ok()?;
    if end < start {
        return None;
    }
    Some((start, Some(end)))
}

/// Evaluate an optional Range header value against the object's total size.
pub fn evaluate_range(header: Option<&str>, total: u64) -> RangeOutcome {
    let Some(header) = header else {
        return RangeOutcome::Full;
    };
    let Some((start, end)) = parse_single_byte_range(header) else {
        return RangeOutcome::Full;
    };
    if start >= total {
        return RangeOutcome::Unsatisfiable;
    }
    // An end past the last byte is clamped, not rejected
    let end = end.map(|e| e.min(total - 1)).unwrap_or(total - 1);
    RangeOutcome::Partial { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header_serves_full_body() {
        assert_eq!(evaluate_range(None, 1000), RangeOutcome::Full);
    }

    #[test]
    fn bounded_range() {
        assert_eq!(
            evaluate_range(Some("bytes=0-499"), 1000),
            RangeOutcome::Partial { start: 0, end: 499 }
        );
        assert_eq!(
            evaluate_range(Some("bytes=500-999"), 1000),
            RangeOutcome::Partial {
                start: 500,
                end: 999
            }
        );
    }

    #[test]
    fn open_ended_range_runs_to_last_byte() {
        assert_eq!(
            evaluate_range(Some("bytes=200-"), 1000),
            RangeOutcome::Partial {
                start: 200,
                end: 999
            }
        );
    }

    #[test]
    fn end_clamped_to_object_size() {
        assert_eq!(
            evaluate_range(Some("bytes=900-5000"), 1000),
            RangeOutcome::Partial {
                start: 900,
                end: 999
            }
        );
    }

    #[test]
    fn start_at_or_past_end_is_unsatisfiable() {
        assert_eq!(
            evaluate_range(Some("bytes=1000-"), 1000),
            RangeOutcome::Unsatisfiable
        );
        assert_eq!(
            evaluate_range(Some("bytes=5000-6000"), 1000),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn single_byte_object() {
        assert_eq!(
            evaluate_range(Some("bytes=0-0"), 1),
            RangeOutcome::Partial { start: 0, end: 0 }
        );
        assert_eq!(
            evaluate_range(Some("bytes=1-"), 1),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn malformed_ranges_ignored() {
        for header in [
            "bytes=",
            "bytes=-",
            "bytes=abc-def",
            "bytes=100",
            "bytes=500-100",
            "bytes=-500",
            "items=0-10",
            "bytes=0-10,20-30",
            "garbage",
        ] {
            assert_eq!(
                evaluate_range(Some(header), 1000),
                RangeOutcome::Full,
                "header {header:?} should be ignored"
            );
        }
    }
}
