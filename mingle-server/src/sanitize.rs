use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for markup fragments: opening, closing, and declaration
/// tags. Anything that starts a tag and runs to the next `>` is removed.
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[!a-zA-Z][^>]*>").expect("Failed to compile markup regex")
});

/// Clean free-text input before storage.
///
/// Tags are stripped outright and any stray angle brackets left behind are
/// escaped, so stored content can never re-enter a rendered page as live
/// markup. Leading and trailing whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use mingle_server::sanitize::clean;
/// assert_eq!(clean("hello <b>world</b>"), "hello world");
/// assert_eq!(clean("2 < 3"), "2 &lt; 3");
/// ```
pub fn clean(input: &str) -> String {
    let stripped = MARKUP_REGEX.replace_all(input, "");
    stripped
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .trim()
        .to_string()
}
