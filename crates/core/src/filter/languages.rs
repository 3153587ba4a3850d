//! Language detection from release titles.

/// Release-title tokens and the ISO 639-1 code they imply.
const LANGUAGE_TOKENS: &[(&str, &str)] = &[
    ("english", "en"),
    ("eng", "en"),
    ("french", "fr"),
    ("francais", "fr"),
    ("truefrench", "fr"),
    ("vff", "fr"),
    ("vf", "fr"),
    ("vostfr", "fr"),
    ("fre", "fr"),
    ("german", "de"),
    ("deutsch", "de"),
    ("ger", "de"),
    ("spanish", "es"),
    ("espanol", "es"),
    ("castellano", "es"),
    ("spa", "es"),
    ("italian", "it"),
    ("italiano", "it"),
    ("ita", "it"),
    ("portuguese", "pt"),
    ("dublado", "pt"),
    ("russian", "ru"),
    ("rus", "ru"),
    ("japanese", "ja"),
    ("jap", "ja"),
    ("korean", "ko"),
    ("kor", "ko"),
    ("dutch", "nl"),
    ("swedish", "sv"),
    ("polish", "pl"),
    ("pol", "pl"),
];

/// Languages mentioned in a title, deduplicated, in order of appearance.
pub fn detect_languages(title: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();
    for token in title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if let Some((_, code)) = LANGUAGE_TOKENS.iter().find(|(t, _)| *t == token) {
            if !found.contains(code) {
                found.push(code);
            }
        }
    }
    found
}
