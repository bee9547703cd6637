//! `Range` request header

/// How a `Range` header applies to a body of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole body
    Full,
    /// Serve `start..=end`
    Partial { start: u64, end: u64 },
    /// No byte of the requested range exists
    Unsatisfiable,
}

impl ByteRange {
    /// Interpret `header` against a body of `len` bytes.
    ///
    /// Only a single `bytes=` range is honored; malformed headers and
    /// multi-range requests fall back to the full body.
    pub fn parse(header: Option<&str>, len: u64) -> Self {
        let Some(value) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return ByteRange::Full;
        };
        if value.contains(',') {
            return ByteRange::Full;
        }
        let Some((start, end)) = value.trim().split_once('-') else {
            return ByteRange::Full;
        };

        match (start.trim(), end.trim()) {
            ("", "") => ByteRange::Full,
            // Suffix form: the last `n` bytes
            ("", suffix) => match suffix.parse::<u64>() {
                Ok(0) => ByteRange::Unsatisfiable,
                Ok(_) if len == 0 => ByteRange::Unsatisfiable,
                Ok(n) => ByteRange::Partial {
                    start: len.saturating_sub(n),
                    end: len - 1,
                },
                Err(_) => ByteRange::Full,
            },
            (start, end) => {
                let Ok(start) = start.parse::<u64>() else {
                    return ByteRange::Full;
                };
                let end = if end.is_empty() {
                    None
                } else {
                    match end.parse::<u64>() {
                        Ok(end) if end >= start => Some(end),
                        _ => return ByteRange::Full,
                    }
                };
                if start >= len {
                    return ByteRange::Unsatisfiable;
                }
                ByteRange::Partial {
                    start,
                    end: end.map_or(len - 1, |end| end.min(len - 1)),
                }
            }
        }
    }

    /// `Content-Range` header value for this range
    pub fn content_range(&self, len: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => Some(format!("bytes {}-{}/{}", start, end, len)),
            ByteRange::Unsatisfiable => Some(format!("bytes */{}", len)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header() {
        assert_eq!(ByteRange::parse(None, 10), ByteRange::Full);
    }

    #[test]
    fn test_closed_and_open_ranges() {
        assert_eq!(
            ByteRange::parse(Some("bytes=0-4"), 10),
            ByteRange::Partial { start: 0, end: 4 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=5-"), 10),
            ByteRange::Partial { start: 5, end: 9 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=8-100"), 10),
            ByteRange::Partial { start: 8, end: 9 }
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            ByteRange::parse(Some("bytes=-3"), 10),
            ByteRange::Partial { start: 7, end: 9 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=-30"), 10),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(ByteRange::parse(Some("bytes=-0"), 10), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(ByteRange::parse(Some("bytes=10-12"), 10), ByteRange::Unsatisfiable);
        assert_eq!(ByteRange::parse(Some("bytes=0-"), 0), ByteRange::Unsatisfiable);
        assert_eq!(
            ByteRange::Unsatisfiable.content_range(10).as_deref(),
            Some("bytes */10")
        );
    }

    #[test]
    fn test_ignored_headers() {
        assert_eq!(ByteRange::parse(Some("items=0-4"), 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=0-1,4-5"), 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=abc"), 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=5-2"), 10), ByteRange::Full);
    }

    #[test]
    fn test_content_range() {
        let range = ByteRange::Partial { start: 2, end: 5 };
        assert_eq!(range.content_range(10).as_deref(), Some("bytes 2-5/10"));
        assert_eq!(ByteRange::Full.content_range(10), None);
    }
}
