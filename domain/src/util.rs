//! Shared string helpers.

/// Longest prefix of `s` within `max_bytes` that ends on a char boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Like [`truncate_str`], but appends `...` when something was cut.
pub fn ellipsize(s: &str, max_bytes: usize) -> String {
    let head = truncate_str(s, max_bytes);
    if head.len() < s.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
