//! Registration gate.
//!
//! A land record may only be written after a `Verified` outcome. The
//! verified document also fills in whatever the user left blank.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::verification::{FieldCandidates, VerificationOutcome};

#[derive(Error, Debug, PartialEq)]
pub enum RegistrationError {
    #[error("Registration blocked: document verification {status}")]
    NotVerified { status: &'static str },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Area must be a positive number of square metres")]
    InvalidArea,
}

/// Land record as entered on the registration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub division: String,
    pub district: String,
    pub ada_number: String,
    pub parsel_number: String,
    /// Free-text survey reference, e.g. `Ada: 1234 / Parsel: 56`.
    pub survey_no: String,
    pub area_value: Option<u64>,
    pub area_unit: String,
}

/// A draft cleared for writing, with the evidence that cleared it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizedRegistration {
    pub draft: RegistrationDraft,
    pub match_score: f64,
    pub authenticity_confidence: f32,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Fill blank draft fields from a verified document.
///
/// District, parcel and area are only written when the user left them empty.
/// The survey reference is always rebuilt from the verified Ada number.
/// Returns `false` and leaves the draft untouched for any other outcome.
pub fn apply_enrichment(draft: &mut RegistrationDraft, outcome: &VerificationOutcome) -> bool {
    let VerificationOutcome::Verified { fields, .. } = outcome else {
        return false;
    };
    enrich_from_fields(draft, fields);
    true
}

fn enrich_from_fields(draft: &mut RegistrationDraft, fields: &FieldCandidates) {
    if is_blank(&draft.district) {
        if let Some(district) = &fields.district {
            draft.district = district.clone();
        }
    }
    if is_blank(&draft.parsel_number) {
        if let Some(parsel) = &fields.parsel_number {
            draft.parsel_number = parsel.clone();
        }
    }
    if draft.area_value.is_none() {
        if let Some(area) = fields.area_value.filter(|a| a.is_finite() && *a >= 0.0) {
            draft.area_value = Some(area.floor() as u64);
        }
    }

    let ada = fields.ada_number.as_deref().unwrap_or(draft.ada_number.trim());
    let parsel = fields
        .parsel_number
        .as_deref()
        .unwrap_or(draft.parsel_number.trim());
    draft.survey_no = format!("Ada: {ada} / Parsel: {parsel}");
}

/// Clear a draft for writing.
///
/// Only a `Verified` outcome unlocks registration; the draft must also carry
/// a division, a district, an Ada number and a positive area.
pub fn authorize(
    draft: &RegistrationDraft,
    outcome: &VerificationOutcome,
) -> Result<AuthorizedRegistration, RegistrationError> {
    let VerificationOutcome::Verified {
        score,
        authenticity_confidence,
        ..
    } = outcome
    else {
        warn!(status = outcome.status(), "Registration blocked");
        return Err(RegistrationError::NotVerified {
            status: outcome.status(),
        });
    };

    for (name, value) in [
        ("division", &draft.division),
        ("district", &draft.district),
        ("ada_number", &draft.ada_number),
    ] {
        if is_blank(value) {
            return Err(RegistrationError::MissingField(name));
        }
    }
    match draft.area_value {
        Some(area) if area > 0 => {}
        _ => return Err(RegistrationError::InvalidArea),
    }

    info!(score, "Registration authorized");
    Ok(AuthorizedRegistration {
        draft: draft.clone(),
        match_score: *score,
        authenticity_confidence: *authenticity_confidence,
    })
}
