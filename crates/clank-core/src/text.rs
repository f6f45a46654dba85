//! Text helpers shared by the pipelines.

use once_cell::sync::Lazy;
use regex::Regex;

// Pictographs plus the joiners, selectors, skin tones and flag letters that
// glue multi-codepoint emojis together. `\p{Emoji}` is avoided because it
// matches ASCII digits.
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\u{FE0F}\u{200D}\p{Emoji_Modifier}\u{1F1E6}-\u{1F1FF}]")
        .unwrap()
});

/// Remove every emoji from `text`.
pub fn strip_emojis(text: &str) -> String {
    EMOJI_RE.replace_all(text, "").into_owned()
}

pub fn contains_emoji(text: &str) -> bool {
    EMOJI_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_emojis() {
        assert_eq!(strip_emojis("love it 😍🔥"), "love it ");
        assert_eq!(strip_emojis("👍🏽"), "");
        assert_eq!(strip_emojis("👨‍👩‍👧 family plan"), " family plan");
        assert_eq!(strip_emojis("🇪🇸"), "");
    }

    #[test]
    fn test_digits_are_not_emojis() {
        assert_eq!(strip_emojis("version 2.0 #1"), "version 2.0 #1");
        assert!(!contains_emoji("3 stars"));
        assert!(contains_emoji("3 ⭐"));
    }
}
