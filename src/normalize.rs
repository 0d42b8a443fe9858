// 🔤 Name Normalization - the identity key for every guest comparison
//
// "Álvaro  GÓMEZ " → "alvaro gomez"
// Exact equality on the normalized form decides "same person". No fuzzy matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Trim, lower-case, strip diacritics and collapse whitespace runs.
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when both names normalize to the same non-empty key.
pub fn same_person(a: &str, b: &str) -> bool {
    let key = normalize_name(a);
    !key.is_empty() && key == normalize_name(b)
}
