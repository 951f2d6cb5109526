//! Bounds-checked slicing shared by the extractors and the pipeline
//!
//! tree-sitter reports byte offsets. They are trusted for position but not
//! for UTF-8 alignment, so every slice into source text goes through here.

/// Safely extract a byte slice with bounds checking
///
/// Returns None if `start > end` or `end` exceeds the source length.
///
/// # Example
/// ```rust
/// use meridian::common::safe_slice;
/// let source = b"hello world";
/// assert_eq!(safe_slice(source, 0, 5), Some(&b"hello"[..]));
/// assert_eq!(safe_slice(source, 10, 20), None);
/// ```
pub fn safe_slice(source: &[u8], start: usize, end: usize) -> Option<&[u8]> {
    if start <= end && end <= source.len() {
        Some(&source[start..end])
    } else {
        None
    }
}

/// Safely extract a string slice; None if out of bounds or off a char boundary
pub fn safe_str_slice(source: &str, start: usize, end: usize) -> Option<&str> {
    if start <= end && end <= source.len() {
        source.get(start..end)
    } else {
        None
    }
}

/// Text of a definition span, snapped inward to valid char boundaries
///
/// Never fails: a span that is out of range or collapses to nothing yields
/// an empty string, so a bad offset costs the node its content, not the file.
///
/// # Example
/// ```rust
/// use meridian::common::span_text;
/// let source = "def f():\n    return '\u{1f44b}'\n";
/// assert_eq!(span_text(source, 0, 7), "def f()");
/// // end offset inside the emoji snaps back before it
/// assert_eq!(span_text(source, 0, 23), "def f():\n    return '");
/// ```
pub fn span_text(source: &str, start: usize, end: usize) -> String {
    let start = find_char_boundary_after(source, start);
    let end = find_char_boundary_before(source, end);
    safe_str_slice(source, start, end)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Nearest char boundary at or before `offset`
fn find_char_boundary_before(s: &str, offset: usize) -> usize {
    let mut pos = offset.min(s.len());
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Nearest char boundary at or after `offset`
fn find_char_boundary_after(s: &str, offset: usize) -> usize {
    let mut pos = offset.min(s.len());
    while pos < s.len() && !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_slice_bounds() {
        let source = b"abc";
        assert_eq!(safe_slice(source, 0, 3), Some(&b"abc"[..]));
        assert_eq!(safe_slice(source, 2, 1), None);
        assert_eq!(safe_slice(source, 0, 4), None);
    }

    #[test]
    fn test_safe_str_slice_rejects_split_char() {
        let source = "a\u{e9}b"; // e-acute is 2 bytes
        assert_eq!(safe_str_slice(source, 0, 1), Some("a"));
        assert_eq!(safe_str_slice(source, 0, 2), None);
        assert_eq!(safe_str_slice(source, 0, 3), Some("a\u{e9}"));
    }

    #[test]
    fn test_span_text_snaps_to_boundaries() {
        let source = "\u{4e2d}\u{6587}x"; // two 3-byte CJK chars
        assert_eq!(span_text(source, 1, 7), "\u{6587}x");
        assert_eq!(span_text(source, 0, 4), "\u{4e2d}");
        assert_eq!(span_text(source, 50, 60), "");
        assert_eq!(span_text(source, 5, 2), "");
    }
}
