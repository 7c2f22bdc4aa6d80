//! Operator-facing text for verification outcomes.
//!
//! Every report carries the numbers behind the decision; a refusal is never
//! shown without its confidence or score.

use std::fmt;

use super::types::{FieldCandidates, MatchSource, VerificationOutcome};

const RULE: &str = "----------------------------";

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn or_not_detected(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Not detected")
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &FieldCandidates) -> fmt::Result {
    writeln!(f, "Parsel: {}", or_not_detected(&fields.parsel_number))?;
    writeln!(f, "Location: {}", or_not_detected(&fields.district))?;
    match fields.area_value {
        Some(area) => writeln!(f, "Area: {area} m²"),
        None => writeln!(f, "Area: Not detected"),
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected {
                reason,
                authenticity_confidence,
            } => {
                writeln!(f, "DOCUMENT REJECTED")?;
                writeln!(f, "{RULE}")?;
                writeln!(
                    f,
                    "Authenticity Confidence: {}",
                    percent(f64::from(*authenticity_confidence))
                )?;
                writeln!(f, "The image is {reason}.")?;
                write!(f, "Upload a clear photo of the title deed.")
            }
            Self::Mismatch {
                claimed,
                extracted,
                score,
                threshold,
                authenticity_confidence,
            } => {
                writeln!(f, "ADA NUMBER MISMATCH")?;
                writeln!(f, "{RULE}")?;
                writeln!(f, "Your Input: {claimed}")?;
                writeln!(f, "Document: {extracted}")?;
                writeln!(f, "Match Score: {} [FAIL]", percent(*score))?;
                writeln!(f, "Required: {} match or higher", percent(*threshold))?;
                writeln!(
                    f,
                    "Authenticity Confidence: {}",
                    percent(f64::from(*authenticity_confidence))
                )?;
                writeln!(f, "{RULE}")?;
                writeln!(f, "Registration BLOCKED.")?;
                write!(f, "Please verify your Ada Number is correct.")
            }
            Self::Unresolved {
                candidate_numbers,
                fields,
                authenticity_confidence,
            } => {
                writeln!(f, "ADA NUMBER NOT DETECTED")?;
                writeln!(
                    f,
                    "Authenticity Confidence: {}",
                    percent(f64::from(*authenticity_confidence))
                )?;
                writeln!(f, "{RULE}")?;
                writeln!(f, "Numbers found in document:")?;
                if candidate_numbers.is_empty() {
                    writeln!(f, "None detected")?;
                } else {
                    writeln!(f, "{}", candidate_numbers.join(", "))?;
                }
                writeln!(f, "District Detected: {}", or_not_detected(&fields.district))?;
                writeln!(f, "{RULE}")?;
                write!(
                    f,
                    "If your Ada Number appears above, the document may be valid. Check image quality."
                )
            }
            Self::Verified {
                fields,
                score,
                source,
                authenticity_confidence,
            } => {
                writeln!(f, "ADA NUMBER VERIFIED")?;
                writeln!(f, "{RULE}")?;
                writeln!(f, "Document: {}", or_not_detected(&fields.ada_number))?;
                writeln!(f, "Match Score: {} [PASS]", percent(*score))?;
                if *source == MatchSource::FuzzyRecovery {
                    writeln!(f, "Located by OCR-tolerant search")?;
                }
                writeln!(f, "{RULE}")?;
                writeln!(
                    f,
                    "Authenticity Confidence: {}",
                    percent(f64::from(*authenticity_confidence))
                )?;
                write_fields(f, fields)?;
                writeln!(f, "{RULE}")?;
                write!(f, "You may proceed to register this land.")
            }
        }
    }
}
