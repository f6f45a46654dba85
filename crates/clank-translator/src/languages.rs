//! Language names the model may answer with.

/// Every language the engine can name, upper-cased.
pub const LANGUAGES: &[&str] = &[
    "AFRIKAANS", "ALBANIAN", "ARABIC", "ARMENIAN", "AZERBAIJANI", "BASQUE", "BELARUSIAN",
    "BENGALI", "BOKMAL", "BOSNIAN", "BULGARIAN", "CATALAN", "CHINESE", "CROATIAN", "CZECH",
    "DANISH", "DUTCH", "ENGLISH", "ESPERANTO", "ESTONIAN", "FINNISH", "FRENCH", "GANDA",
    "GEORGIAN", "GERMAN", "GREEK", "GUJARATI", "HEBREW", "HINDI", "HUNGARIAN", "ICELANDIC",
    "INDONESIAN", "IRISH", "ITALIAN", "JAPANESE", "KAZAKH", "KOREAN", "LATIN", "LATVIAN",
    "LITHUANIAN", "MACEDONIAN", "MALAY", "MAORI", "MARATHI", "MONGOLIAN", "NYNORSK", "PERSIAN",
    "POLISH", "PORTUGUESE", "PUNJABI", "ROMANIAN", "RUSSIAN", "SERBIAN", "SHONA", "SLOVAK",
    "SLOVENE", "SOMALI", "SOTHO", "SPANISH", "SWAHILI", "SWEDISH", "TAGALOG", "TAMIL", "TELUGU",
    "THAI", "TSONGA", "TSWANA", "TURKISH", "UKRAINIAN", "URDU", "VIETNAMESE", "WELSH", "XHOSA",
    "YORUBA", "ZULU",
];

pub fn is_known_language(name: &str) -> bool {
    LANGUAGES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        assert_eq!(LANGUAGES.len(), 75);
        assert!(is_known_language("SPANISH"));
        assert!(!is_known_language("Spanish"));
        assert!(!is_known_language("KLINGON"));
    }
}
