use super::numerals::fold_one_zero_letterforms;
use super::types::MatchResult;

/// Score for identical identifiers.
pub const EXACT_MATCH_SCORE: f64 = 1.0;

/// Score for identifiers that differ only in 1/0 letterforms. Kept below
/// `EXACT_MATCH_SCORE` so reports can tell the two apart.
pub const OCR_EQUIVALENT_SCORE: f64 = 0.98;

/// Similarity in `[0, 1]` between a claimed and an extracted identifier.
///
/// Whitespace is removed from both first. Rules, first applicable wins:
/// 1. either side empty → 0
/// 2. equal → 1.0
/// 3. equal after folding 1/0 letterforms → 0.98
/// 4. positional matches over the shorter length ÷ the longer length,
///    times `1 − |len difference| / longer length`
///
/// Rule 4 compares characters at the same index only, so one inserted or
/// dropped leading character degrades the score sharply. Known limitation;
/// changing it would change acceptance outcomes.
pub fn score(claimed: &str, extracted: &str) -> f64 {
    let claimed = strip_whitespace(claimed);
    let extracted = strip_whitespace(extracted);

    if claimed.is_empty() || extracted.is_empty() {
        return 0.0;
    }
    if claimed == extracted {
        return EXACT_MATCH_SCORE;
    }
    if fold_one_zero_letterforms(&claimed) == fold_one_zero_letterforms(&extracted) {
        return OCR_EQUIVALENT_SCORE;
    }

    let a: Vec<char> = claimed.chars().collect();
    let b: Vec<char> = extracted.chars().collect();
    let max_len = a.len().max(b.len()) as f64;
    let positional = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count() as f64;

    let base = positional / max_len;
    let length_penalty = 1.0 - a.len().abs_diff(b.len()) as f64 / max_len;

    base * length_penalty
}

pub fn match_result(claimed: &str, extracted: &str, threshold: f64) -> MatchResult {
    MatchResult::new(score(claimed, extracted), threshold)
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
