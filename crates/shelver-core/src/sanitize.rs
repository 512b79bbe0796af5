//! Path segment sanitizing for tag values.

/// Map an arbitrary tag value to a string that is safe to use as a single
/// path segment.
///
/// Keeps alphanumeric characters (any script), `.`, `_` and space, drops
/// everything else, then trims trailing whitespace. Never fails.
pub fn sanitize(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | ' '))
        .collect();
    kept.trim_end().to_string()
}

/// Whether a sanitized segment can be joined onto a path without escaping
/// its parent: empty segments and segments made only of dots are rejected.
pub fn is_usable_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().all(|c| c == '.')
}
