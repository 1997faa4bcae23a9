//! Small text helpers.

/// Characters of message text kept in log lines.
pub const LOG_PREVIEW_CHARS: usize = 100;

/// Truncates a string to at most `max_chars` characters (not bytes).
///
/// UTF-8 safe; borrows the input when it already fits.
///
/// # Examples
///
/// ```
/// use album_relay_core::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    s.char_indices()
        .nth(max_chars)
        .map_or(s, |(pos, _)| &s[..pos])
}

/// Short form of message text for structured log fields.
#[must_use]
pub fn preview(s: &str) -> &str {
    truncate_str(s, LOG_PREVIEW_CHARS)
}
