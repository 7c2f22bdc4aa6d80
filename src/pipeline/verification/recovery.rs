//! Fallbacks for documents whose Ada label is unreadable.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

/// 2–6 digits with an ASCII word boundary on each side.
static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[0-9]{2,6}(?-u:\b)").expect("Invalid numeric token regex pattern")
});

/// Tolerant pattern for a claimed identifier: each digit widens to the glyphs
/// OCR confuses it with, and any whitespace may sit between positions.
pub fn fuzzy_pattern(claimed: &str) -> String {
    let positions: Vec<String> = claimed
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '1' => "[1lI|]".to_string(),
            '0' => "[0Oo]".to_string(),
            '5' => "[5Ss]".to_string(),
            '8' => "[8B]".to_string(),
            other => regex::escape(&other.to_string()),
        })
        .collect();

    format!("(?i){}", positions.join(r"\s*"))
}

/// Search `text` for the claimed identifier allowing OCR confusions.
///
/// A hit returns the claim itself (trimmed), not the matched substring: the
/// match only confirms presence.
pub fn recover(text: &str, claimed: &str) -> Option<String> {
    let claimed = claimed.trim();
    if claimed.is_empty() {
        return None;
    }

    let pattern = fuzzy_pattern(claimed);
    let regex = match Regex::new(&pattern) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "Fuzzy pattern did not compile");
            return None;
        }
    };

    match regex.find(text) {
        Some(found) => {
            debug!(matched = found.as_str(), claimed, "Fuzzy recovery hit");
            Some(claimed.to_string())
        }
        None => {
            debug!(claimed, "Fuzzy recovery found nothing");
            None
        }
    }
}

/// Distinct 2–6 digit tokens bounded by non-word characters, first-seen
/// order, at most `limit`.
///
/// Longer digit runs are skipped entirely rather than split.
pub fn numeric_candidates(text: &str, limit: usize) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for m in NUMERIC_TOKEN.find_iter(text) {
        if found.len() >= limit {
            break;
        }
        let token = m.as_str();
        if !found.iter().any(|f| f == token) {
            found.push(token.to_string());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_widens_confusable_digits() {
        assert_eq!(
            fuzzy_pattern("1058"),
            r"(?i)[1lI|]\s*[0Oo]\s*[5Ss]\s*[8B]"
        );
    }

    #[test]
    fn pattern_escapes_other_characters() {
        assert_eq!(fuzzy_pattern("2.3"), r"(?i)2\s*\.\s*3");
        assert_eq!(fuzzy_pattern(" 1 2 "), r"(?i)[1lI|]\s*2");
    }

    #[test]
    fn recovers_spaced_digits() {
        let text = "kayit 1 2 3 4 tarla";
        assert_eq!(recover(text, "1234").as_deref(), Some("1234"));
    }

    #[test]
    fn recovers_letter_confusions() {
        assert_eq!(recover("no: lO5B", "1058").as_deref(), Some("1058"));
        assert_eq!(recover("x I2S x", "125").as_deref(), Some("125"));
    }

    #[test]
    fn returns_trimmed_claim_not_match() {
        assert_eq!(recover("l 2 3 4", "  1234 ").as_deref(), Some("1234"));
    }

    #[test]
    fn misses_when_digits_absent() {
        assert_eq!(recover("Ada yok 5678", "1234"), None);
    }

    #[test]
    fn empty_claim_never_recovers() {
        assert_eq!(recover("1234", ""), None);
        assert_eq!(recover("1234", "   "), None);
    }

    #[test]
    fn regex_metacharacters_in_claim_are_literal() {
        assert_eq!(recover("abc", "a.c*"), None);
        assert_eq!(recover("a.c*", "a.c*").as_deref(), Some("a.c*"));
    }

    #[test]
    fn candidates_first_seen_and_deduplicated() {
        let text = "12 ve 345, sonra 6789 ve yine 12 ile 345";
        assert_eq!(numeric_candidates(text, 10), vec!["12", "345", "6789"]);
    }

    #[test]
    fn candidates_require_word_boundaries() {
        let text = "A12 34b 5 1234567 _99 (77)";
        assert_eq!(numeric_candidates(text, 10), vec!["77"]);
    }

    #[test]
    fn candidates_respect_limit() {
        let text = (10..40).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let found = numeric_candidates(&text, 10);
        assert_eq!(found.len(), 10);
        assert_eq!(found[0], "10");
        assert_eq!(found[9], "19");
    }

    #[test]
    fn candidates_at_text_edges() {
        assert_eq!(numeric_candidates("42", 10), vec!["42"]);
        assert!(numeric_candidates("", 10).is_empty());
    }

    #[test]
    fn candidates_beside_non_ascii_letters() {
        // Turkish letters are not ASCII word characters
        assert_eq!(numeric_candidates("Ada:ğ123ş 45ı", 10), vec!["123", "45"]);
    }
}
