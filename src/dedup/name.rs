use crate::records::NOT_FOUND;

/// Legal-entity suffixes ignored by fuzzy name comparison
const LEGAL_SUFFIXES: &[&str] = &["inc", "llc", "ltd", "corp", "corporation", "company", "co"];

/// Fuzzy matches are only trusted when the cleaned name is longer than this
pub const MIN_FUZZY_LENGTH: usize = 3;

/// Lowercases and trims a display name
///
/// Returns `None` for empty names and for the "N/A" sentinel, which never identifies anything.
///
/// # Examples
///
/// ```
/// use listing_harvest::dedup::normalize_name;
///
/// assert_eq!(normalize_name("  Acme Inc. "), Some("acme inc.".to_string()));
/// assert_eq!(normalize_name("N/A"), None);
/// ```
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_FOUND) {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Normalizes a name and removes trailing legal-entity suffix words such as "Inc." or "LLC"
///
/// Only words at the end of the name are dropped, so "The Company Store" keeps its middle word.
/// Punctuation that commonly surrounds suffixes (`.` and `,`) is treated as whitespace.
pub fn strip_legal_suffixes(name: &str) -> Option<String> {
    let normalized = normalize_name(name)?;
    let spaced = normalized.replace(['.', ','], " ");
    let mut words: Vec<&str> = spaced.split_whitespace().collect();
    while words.last().is_some_and(|word| LEGAL_SUFFIXES.contains(word)) {
        words.pop();
    }

    (!words.is_empty()).then(|| words.join(" "))
}
