//! Text helpers shared by the bot views and the yt-dlp backend.

use unicode_segmentation::UnicodeSegmentation;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use oxide_music_bot::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Truncates a string to at most `max_graphemes` user-perceived characters.
///
/// Unlike [`truncate_str`] this never splits an emoji or a base letter from
/// its combining marks, which matters for titles shown on buttons.
///
/// # Examples
///
/// ```
/// use oxide_music_bot::utils::truncate_graphemes;
/// assert_eq!(truncate_graphemes("🎸🎸🎸", 2), "🎸🎸");
/// assert_eq!(truncate_graphemes("short", 50), "short");
/// ```
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> String {
    match s.grapheme_indices(true).nth(max_graphemes) {
        Some((pos, _)) => s[..pos].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_truncate_graphemes_keeps_clusters() {
        // "e" + combining acute accent is one grapheme but two chars
        let s = "e\u{301}e\u{301}e\u{301}";
        assert_eq!(truncate_graphemes(s, 2), "e\u{301}e\u{301}");
        // Family emoji joined with ZWJ stays intact
        let family = "👨‍👩‍👧 band";
        assert_eq!(truncate_graphemes(family, 1), "👨‍👩‍👧");
    }

    #[test]
    fn test_truncate_graphemes_exact_length() {
        let title = "a".repeat(50);
        assert_eq!(truncate_graphemes(&title, 50), title);
        assert_eq!(truncate_graphemes(&"b".repeat(51), 50), "b".repeat(50));
    }

    proptest! {
        #[test]
        fn truncate_graphemes_is_prefix(s in "\\PC{0,80}", max in 0usize..60) {
            let out = truncate_graphemes(&s, max);
            prop_assert!(s.starts_with(&out));
            prop_assert!(out.graphemes(true).count() <= max);
        }
    }
}
