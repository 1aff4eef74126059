//! FILENAME: hierarchy-engine/src/path.rs
//! Delimited path parsing.

/// Splits `raw` on `separator` into trimmed, non-empty segments.
///
/// Malformed input (blank string, only separators, empty separator) yields an
/// empty list; callers skip such records.
pub fn parse_path<'a>(raw: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return Vec::new();
    }
    raw.split(separator)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// First segment of a path, without allocating the full segment list.
pub fn first_segment<'a>(raw: &'a str, separator: &str) -> Option<&'a str> {
    if separator.is_empty() {
        return None;
    }
    raw.split(separator)
        .map(str::trim)
        .find(|segment| !segment.is_empty())
}

/// Whether the raw path contains the separator at all (the flat-dimension test).
pub fn is_nested(raw: &str, separator: &str) -> bool {
    !separator.is_empty() && raw.contains(separator)
}
