//! HTTP Range request parsing module
//!
//! Single `bytes` ranges only (RFC 7233), enough for viewers that fetch a
//! GLB header before the rest of the file.

/// Inclusive byte range already clamped to the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve only this slice with 206
    Valid(ByteRange),
    /// Range outside the file, answer 416
    NotSatisfiable,
    /// No header, other unit, multi-range or garbage: serve the whole file
    None,
}

/// Parse a `Range` header against a file of `file_size` bytes
///
/// Accepts `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(ranges) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };
    if ranges.contains(',') {
        return RangeParseResult::None;
    }
    let Some((start_str, end_str)) = ranges.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if file_size == 0 {
        return if start_str.is_empty() && end_str.is_empty() {
            RangeParseResult::None
        } else {
            RangeParseResult::NotSatisfiable
        };
    }
    let last = file_size - 1;

    if start_str.is_empty() {
        // Suffix range: last N bytes
        return match end_str.parse::<usize>() {
            Ok(0) => RangeParseResult::NotSatisfiable,
            Ok(suffix) => RangeParseResult::Valid(ByteRange {
                start: file_size.saturating_sub(suffix),
                end: last,
            }),
            Err(_) => RangeParseResult::None,
        };
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start > last {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        last
    } else {
        match end_str.parse::<usize>() {
            Ok(e) => e.min(last),
            Err(_) => return RangeParseResult::None,
        }
    };
    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
