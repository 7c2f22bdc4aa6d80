//! Verification orchestrator and decision policy.
//!
//! authenticity gate → normalize → OCR (sparse, maybe block) → extract →
//! [fuzzy recovery] → score → outcome.
//!
//! The oracle and the OCR engine are injected as trait objects so the whole
//! flow runs against mocks in tests.

use tracing::{info, warn};

use crate::config::VerifierConfig;

use super::authenticity::validate_confidence;
use super::extractor::extract;
use super::ocr::recognize;
use super::preprocess::normalize;
use super::recovery::{numeric_candidates, recover};
use super::scoring::match_result;
use super::types::{AuthenticityOracle, DocumentImage, MatchSource, OcrEngine, VerificationOutcome};
use super::VerificationError;

/// Reason attached to every authenticity rejection.
pub const REJECTION_REASON: &str = "not a recognizable document of this type";

/// Runs one verification attempt end to end.
pub struct DocumentVerifier {
    oracle: Box<dyn AuthenticityOracle>,
    ocr: Box<dyn OcrEngine>,
    config: VerifierConfig,
}

impl DocumentVerifier {
    pub fn new(oracle: Box<dyn AuthenticityOracle>, ocr: Box<dyn OcrEngine>) -> Self {
        Self::with_config(oracle, ocr, VerifierConfig::default())
    }

    pub fn with_config(
        oracle: Box<dyn AuthenticityOracle>,
        ocr: Box<dyn OcrEngine>,
        config: VerifierConfig,
    ) -> Self {
        Self { oracle, ocr, config }
    }

    /// Verify that `image` is a title deed carrying the `claimed` Ada number.
    ///
    /// 1. Authenticity gate (no OCR below the threshold)
    /// 2. Normalize for OCR
    /// 3. OCR with the sparse → block policy
    /// 4. Decide on the recognized text
    ///
    /// Errors mean the pipeline could not run; every expected result,
    /// including "nothing found", is a `VerificationOutcome`.
    pub fn verify(
        &self,
        image: &DocumentImage,
        claimed: &str,
    ) -> Result<VerificationOutcome, VerificationError> {
        let claimed = claimed.trim();
        if claimed.is_empty() {
            return Err(VerificationError::MissingClaim);
        }

        // Step 1: authenticity gate
        let confidence = validate_confidence(self.oracle.confidence(image)?)?;
        if confidence < self.config.authenticity_threshold {
            warn!(
                confidence,
                threshold = self.config.authenticity_threshold,
                "Document rejected at authenticity gate"
            );
            return Ok(rejected(confidence));
        }
        info!(confidence, "Authenticity check passed");

        // Step 2: normalize
        let normalized = normalize(image, &self.config.normalizer);

        // Step 3: OCR. The session is released when it leaves this block,
        // whether recognition succeeded or not.
        let attempt = {
            let mut session = self.ocr.open_session()?;
            recognize(
                session.as_mut(),
                &normalized,
                self.config.min_ocr_text_length,
            )?
        };
        info!(
            mode = attempt.mode.as_str(),
            length = attempt.length,
            "Text extracted"
        );

        // Step 4: decide
        Ok(decide(claimed, &attempt.text, confidence, &self.config))
    }
}

/// Decision policy over already-recognized text.
///
/// Re-applies the authenticity gate so a low-confidence document can never
/// reach `Verified`, whatever the text says.
pub fn decide(
    claimed: &str,
    text: &str,
    authenticity_confidence: f32,
    config: &VerifierConfig,
) -> VerificationOutcome {
    if authenticity_confidence.is_nan() || authenticity_confidence < config.authenticity_threshold
    {
        return rejected(authenticity_confidence);
    }

    let claimed = claimed.trim();
    let mut fields = extract(text);

    let (extracted, source) = match fields.ada_number.clone() {
        Some(ada) => (ada, MatchSource::Structured),
        None => match recover(text, claimed) {
            Some(ada) => {
                info!("Ada number located by fuzzy recovery");
                (ada, MatchSource::FuzzyRecovery)
            }
            None => {
                let candidate_numbers = numeric_candidates(text, config.max_candidate_numbers);
                warn!(
                    candidates = candidate_numbers.len(),
                    "Ada number not detected"
                );
                return VerificationOutcome::Unresolved {
                    candidate_numbers,
                    fields,
                    authenticity_confidence,
                };
            }
        },
    };

    let result = match_result(claimed, &extracted, config.match_threshold);
    info!(
        score = result.score,
        threshold = result.threshold,
        source = ?source,
        "Ada number scored"
    );

    if result.verified {
        fields.ada_number = Some(extracted);
        VerificationOutcome::Verified {
            fields,
            score: result.score,
            source,
            authenticity_confidence,
        }
    } else {
        warn!(claimed, extracted = %extracted, score = result.score, "Ada number mismatch");
        VerificationOutcome::Mismatch {
            claimed: claimed.to_string(),
            extracted,
            score: result.score,
            threshold: result.threshold,
            authenticity_confidence,
        }
    }
}

fn rejected(authenticity_confidence: f32) -> VerificationOutcome {
    VerificationOutcome::Rejected {
        reason: REJECTION_REASON.to_string(),
        authenticity_confidence,
    }
}
