//! OCR glyph confusions for numeric identifiers.

/// Rewrite glyphs OCR commonly emits in place of digits, then drop anything
/// that is still not an ASCII digit.
///
/// `l`, `I`, `|` → `1`; `O` → `0`; `S` → `5`; `B` → `8`.
pub fn canonicalize_numerals(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'l' | 'I' | '|' => '1',
            'O' => '0',
            'S' => '5',
            'B' => '8',
            other => other,
        })
        .filter(char::is_ascii_digit)
        .collect()
}

/// Fold the letterforms of 1 and 0 onto the digits, leaving everything else.
/// Used by the scorer to recognise OCR-only differences.
pub fn fold_one_zero_letterforms(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'l' | 'I' => '1',
            'O' | 'o' => '0',
            other => other,
        })
        .collect()
}
