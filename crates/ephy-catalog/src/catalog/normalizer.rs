use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const TRADEMARK_GLYPHS: [char; 3] = ['\u{00ae}', '\u{2122}', '\u{00a9}'];

/// Lookup key for a product display name.
///
/// Strips the registered/trademark/copyright glyphs, lowercases and trims.
/// Nothing else is transliterated, so accents survive.
pub fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(&TRADEMARK_GLYPHS[..], "");
    cleaned.to_lowercase().trim().to_string()
}

/// Upper-cased, accent-free form used when matching free-text tokens and
/// column headers ("Autorisé" and "AUTORISE" fold to the same text).
pub(crate) fn fold_for_matching(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_uppercase()
}
