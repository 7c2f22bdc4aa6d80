//! Structured field extraction from title-deed OCR text.
//!
//! Patterns are data: one ordered table, most specific first per field.
//! The first pattern that matches wins; there is no best-match scoring.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::numerals::canonicalize_numerals;
use super::types::FieldCandidates;

/// Fields located through the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AdaNumber,
    ParselNumber,
    District,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdaNumber => "ada_number",
            Self::ParselNumber => "parsel_number",
            Self::District => "district",
        }
    }
}

/// A compiled pattern and the field its first capture group fills.
pub struct FieldPattern {
    pub field: Field,
    pub regex: Regex,
    pub description: &'static str,
}

/// Number token: up to six digits, optionally with single OCR look-alike
/// glyphs between them and one in front (`l234`, `12O4`). Always ends on a
/// digit. Case-sensitive even inside `(?i)` patterns so that ordinary
/// lowercase letters are never read as digits.
const NUM: &str = r"(?-i:([lI|O]?[0-9](?:[lI|OSB]?[0-9]){0,5}))";

static FIELD_PATTERNS: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| {
    vec![
        // ── Ada (plot) number ──
        pattern(
            Field::AdaNumber,
            &format!(r"(?i)Ada\s*(?:No|Nu)?[^0-9\n]{{0,10}}?{NUM}"),
            "Ada/Ada No then a short gap then the number",
        ),
        pattern(
            Field::AdaNumber,
            &format!(r"(?i)Ada\s*No[^0-9]*?{NUM}"),
            "Ada No then any non-digit run then the number",
        ),
        pattern(
            Field::AdaNumber,
            &format!(r"(?i)(?:Ada|Ado)\s*[:.\s]*{NUM}"),
            "Ada/Ado (OCR misread) with punctuation",
        ),
        pattern(
            Field::AdaNumber,
            &format!(r"(?is)Pafta.*?Ada.*?{NUM}.*?(?:Parsel|Nitelik)"),
            "Table row: Pafta .. Ada .. number .. Parsel/Nitelik",
        ),
        pattern(
            Field::AdaNumber,
            &format!(r"(?i){NUM}\s*.*Parsel"),
            "Number ahead of a Parsel mention",
        ),
        // ── Parsel (parcel) number ──
        pattern(
            Field::ParselNumber,
            &format!(r"(?i)Parsel\s*(?:No|Nu)?[^0-9\n]{{0,10}}?{NUM}"),
            "Parsel/Parsel No then a short gap then the number",
        ),
        pattern(
            Field::ParselNumber,
            &format!(r"(?i)(?:Parsel|Parse1|Porsel)\s*[:.\s]*{NUM}"),
            "Parsel with OCR misreads of the label",
        ),
        pattern(
            Field::ParselNumber,
            &format!(r"(?i)rsel\s*[:.\s]*{NUM}"),
            "Partial label ..rsel",
        ),
        // ── District ──
        pattern(
            Field::District,
            r"(?i)(?:İlçesi|Ilçesi|Iicesi|ilcesi)[:\s]*([A-ZİĞÜŞÖÇa-zığüşöç]{3,20})",
            "İlçesi label with OCR variants",
        ),
        pattern(
            Field::District,
            r"(?i)İl\s+([A-ZİĞÜŞÖÇ]{3,15})",
            "İl label followed by a name",
        ),
    ]
});

/// Area in square metres: a grouped decimal right before `m2` / `m²`.
static AREA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9.,]+)\s*m[²2]").expect("Invalid area regex pattern"));

fn pattern(field: Field, regex_str: &str, description: &'static str) -> FieldPattern {
    FieldPattern {
        field,
        regex: Regex::new(regex_str).expect("Invalid field regex pattern"),
        description,
    }
}

/// Patterns for `field`, in priority order.
pub fn patterns_for(field: Field) -> impl Iterator<Item = &'static FieldPattern> {
    FIELD_PATTERNS.iter().filter(move |p| p.field == field)
}

/// Raw capture of the first matching pattern for `field`.
pub fn first_match(field: Field, text: &str) -> Option<String> {
    for p in patterns_for(field) {
        if let Some(value) = p
            .regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty())
        {
            debug!(field = field.as_str(), pattern = p.description, value, "Pattern matched");
            return Some(value.to_string());
        }
    }
    debug!(field = field.as_str(), "No pattern matched");
    None
}

/// Locate every known field in OCR text. Missing fields stay `None`.
pub fn extract(text: &str) -> FieldCandidates {
    let number = |field| {
        first_match(field, text)
            .map(|raw| canonicalize_numerals(&raw))
            .filter(|n| !n.is_empty())
    };

    FieldCandidates {
        ada_number: number(Field::AdaNumber),
        parsel_number: number(Field::ParselNumber),
        district: first_match(Field::District, text)
            .and_then(|raw| raw.split_whitespace().next().map(str::to_string)),
        area_value: extract_area(text),
    }
}

/// `1.234,56 m2` → 1234.56: dots group thousands, the first comma is the
/// decimal separator.
pub fn extract_area(text: &str) -> Option<f64> {
    let raw = AREA_PATTERN.captures(text)?.get(1)?.as_str();
    let cleaned = raw.replace('.', "").replacen(',', ".", 1);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Capture of the `index`-th pattern for `field`, tried in isolation.
    fn capture(field: Field, index: usize, text: &str) -> Option<String> {
        let p = patterns_for(field).nth(index).expect("pattern index out of range");
        p.regex
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    #[test]
    fn table_has_expected_shape() {
        assert_eq!(patterns_for(Field::AdaNumber).count(), 5);
        assert_eq!(patterns_for(Field::ParselNumber).count(), 3);
        assert_eq!(patterns_for(Field::District).count(), 2);
        for p in FIELD_PATTERNS.iter() {
            assert!(!p.description.is_empty());
        }
    }

    // ── Ada patterns, one by one ──

    #[test]
    fn ada_short_gap() {
        assert_eq!(capture(Field::AdaNumber, 0, "Ada No: 1234").as_deref(), Some("1234"));
        assert_eq!(capture(Field::AdaNumber, 0, "ADA NU. 77").as_deref(), Some("77"));
        assert_eq!(capture(Field::AdaNumber, 0, "Ada 905").as_deref(), Some("905"));
    }

    #[test]
    fn ada_short_gap_keeps_leading_letter_one() {
        assert_eq!(capture(Field::AdaNumber, 0, "Ada No l234").as_deref(), Some("l234"));
    }

    #[test]
    fn ada_short_gap_limited_to_ten_characters() {
        assert_eq!(capture(Field::AdaNumber, 0, "Ada No ............ 1234"), None);
    }

    #[test]
    fn ada_no_long_gap() {
        let text = "ADA NO ........... (tescil) 4567";
        assert_eq!(capture(Field::AdaNumber, 1, text).as_deref(), Some("4567"));
    }

    #[test]
    fn ada_label_misread_as_ado() {
        assert_eq!(capture(Field::AdaNumber, 2, "Ado: 789").as_deref(), Some("789"));
        assert_eq!(capture(Field::AdaNumber, 2, "ada . 12").as_deref(), Some("12"));
    }

    #[test]
    fn ada_table_row_spans_lines() {
        let text = "Pafta\nG24\nAda\n\n345\nParsel\n12";
        assert_eq!(capture(Field::AdaNumber, 3, text).as_deref(), Some("345"));
        let text = "Pafta Ada\n345\nNitelik Tarla";
        assert_eq!(capture(Field::AdaNumber, 3, text).as_deref(), Some("345"));
    }

    #[test]
    fn ada_number_before_parsel_mention() {
        assert_eq!(
            capture(Field::AdaNumber, 4, "kayit 1234 numarali Parsel").as_deref(),
            Some("1234")
        );
        assert_eq!(capture(Field::AdaNumber, 4, "1234\nsonra Parsel").as_deref(), Some("1234"));
        assert_eq!(capture(Field::AdaNumber, 4, "1234 without the label"), None);
    }

    #[test]
    fn number_token_ignores_lowercase_letters() {
        // "s" in "Nosu" must not be read as a 5 even under (?i)
        assert_eq!(capture(Field::AdaNumber, 0, "Ada Nosu 31").as_deref(), Some("31"));
    }

    #[test]
    fn number_token_caps_at_six_digits() {
        assert_eq!(capture(Field::AdaNumber, 0, "Ada 12345678").as_deref(), Some("123456"));
    }

    // ── Parsel patterns ──

    #[test]
    fn parsel_short_gap() {
        assert_eq!(capture(Field::ParselNumber, 0, "Parsel No: 56").as_deref(), Some("56"));
    }

    #[test]
    fn parsel_label_misreads() {
        assert_eq!(capture(Field::ParselNumber, 1, "Parse1 : 77").as_deref(), Some("77"));
        assert_eq!(capture(Field::ParselNumber, 1, "Porsel 88").as_deref(), Some("88"));
        assert_eq!(capture(Field::ParselNumber, 0, "Parse1 : 77"), None);
    }

    #[test]
    fn parsel_partial_label() {
        assert_eq!(capture(Field::ParselNumber, 2, "Pcrsel: 99").as_deref(), Some("99"));
    }

    // ── District patterns ──

    #[test]
    fn district_label_variants() {
        assert_eq!(
            capture(Field::District, 0, "İlçesi: ODUNPAZARI Mahallesi").as_deref(),
            Some("ODUNPAZARI")
        );
        assert_eq!(
            capture(Field::District, 0, "Iicesi\nTepebaşı").as_deref(),
            Some("Tepebaşı")
        );
    }

    #[test]
    fn district_il_label() {
        assert_eq!(capture(Field::District, 1, "İl ESKİŞEHİR").as_deref(), Some("ESKİŞEHİR"));
    }

    // ── Full extraction ──

    #[test]
    fn extract_full_document() {
        let text = "TAPU SENEDI\nİlçesi: ODUNPAZARI\nAda No: 1234 Parsel No: 56\n\
                    Yüzölçümü 1.234,56 m2";
        let fields = extract(text);
        assert_eq!(fields.ada_number.as_deref(), Some("1234"));
        assert_eq!(fields.parsel_number.as_deref(), Some("56"));
        assert_eq!(fields.district.as_deref(), Some("ODUNPAZARI"));
        assert!((fields.area_value.unwrap() - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn extract_canonicalizes_ocr_digits() {
        let fields = extract("Ada No l234\nParsel: 1O5");
        assert_eq!(fields.ada_number.as_deref(), Some("1234"));
        assert_eq!(fields.parsel_number.as_deref(), Some("105"));
    }

    #[test]
    fn first_match_wins_over_later_patterns() {
        // Pattern (a) fires on "Ada 12" even though (e) would pick 999.
        let fields = extract("999 Ada 12 Parsel 3");
        assert_eq!(fields.ada_number.as_deref(), Some("12"));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let fields = extract("Bu belge okunamiyor");
        assert_eq!(fields, FieldCandidates::default());
    }

    #[test]
    fn area_variants() {
        assert_eq!(extract_area("450 m²"), Some(450.0));
        assert_eq!(extract_area("Alan: 12,5m2"), Some(12.5));
        assert_eq!(extract_area("1.500 M2"), Some(1500.0));
        assert_eq!(extract_area("Tel. m2"), None);
        assert_eq!(extract_area("no area here"), None);
    }
}
