pub mod types;
pub mod preprocess;
pub mod ocr;
pub mod authenticity;
pub mod numerals;
pub mod extractor;
pub mod recovery;
pub mod scoring;
pub mod decision;
pub mod session;
pub mod report;

pub use types::*;
pub use preprocess::*;
pub use ocr::*;
pub use authenticity::*;
pub use decision::*;
pub use session::*;

use thiserror::Error;

/// Engine-level failures. Expected verification results (rejected,
/// mismatch, unresolved) are `VerificationOutcome` values, never errors.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Authenticity classifier failed: {0}")]
    Classifier(String),

    #[error("Authenticity confidence out of range: {0}")]
    InvalidConfidence(f32),

    #[error("Claimed Ada number is empty")]
    MissingClaim,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Verification task failed: {0}")]
    TaskJoin(String),
}
