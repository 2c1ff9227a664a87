//! Query text canonicalization.
//!
//! Keyword classification must not depend on accents, case, punctuation or
//! spacing, so the raw query is collapsed to a bare lowercase ASCII
//! alphanumeric string before matching.

/// Canonicalize raw query text: fold diacritics, lowercase, drop
/// punctuation and all whitespace.
///
/// Total and idempotent; empty input yields empty output.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(fold_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Fold accented Latin letters onto their ASCII base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
