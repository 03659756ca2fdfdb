//! Text canonicalization for stored catalog values.

/// Uppercase `text` with surrounding whitespace removed and every internal
/// whitespace run collapsed to a single space.
///
/// Used on every stored text value except codes.
pub fn normalize_upper(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Canonical form of a stored code for comparison: trimmed and uppercased.
///
/// Internal characters are left alone; codes follow their own fixed-width
/// rules.
pub fn canonical_code(code: &str) -> String {
    code.trim().to_uppercase()
}
