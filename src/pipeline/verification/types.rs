use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::VerificationError;

/// Decoded document image as captured by the caller. Never mutated.
#[derive(Debug, Clone)]
pub struct DocumentImage {
    pixels: RgbImage,
}

impl DocumentImage {
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Decode PNG / JPEG / TIFF bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, VerificationError> {
        super::preprocess::decode_document(bytes)
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Binarized, upscaled image handed to the OCR engine.
/// Every channel of every pixel is either 0 or 255.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub image: RgbImage,
    /// Luminance threshold that produced the binarization.
    pub threshold: f32,
    /// Mean luminance of the upscaled input.
    pub mean_luminance: f32,
}

/// Page-segmentation hint passed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Scattered text, tables and forms.
    Sparse,
    /// One uniform block of text.
    Block,
}

impl SegmentationMode {
    /// Tesseract `tessedit_pageseg_mode` value.
    pub fn tesseract_psm(self) -> &'static str {
        match self {
            Self::Sparse => "11",
            Self::Block => "6",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Block => "block",
        }
    }
}

/// Result of the OCR invocation policy: the text that extraction will see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrAttempt {
    pub mode: SegmentationMode,
    pub text: String,
    /// Length of `text` in characters.
    pub length: usize,
}

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    /// Engine mean confidence in `[0, 1]`. Informational only.
    pub confidence: f32,
}

/// Values located on the title deed. Every field is independently optional;
/// absence means "not detected", never an empty-string placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidates {
    pub ada_number: Option<String>,
    pub parsel_number: Option<String>,
    pub district: Option<String>,
    /// Square metres.
    pub area_value: Option<f64>,
}

/// Similarity between the claimed and extracted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub score: f64,
    pub threshold: f64,
    pub verified: bool,
}

impl MatchResult {
    pub fn new(score: f64, threshold: f64) -> Self {
        Self {
            score,
            threshold,
            verified: score >= threshold,
        }
    }
}

/// Where the compared Ada number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// A labelled pattern on the document.
    Structured,
    /// An OCR-tolerant hit for the claimed number anywhere in the text.
    FuzzyRecovery,
}

/// Terminal result of one verification attempt.
///
/// Only `Verified` allows the caller to proceed with registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Rejected {
        reason: String,
        authenticity_confidence: f32,
    },
    Mismatch {
        claimed: String,
        extracted: String,
        score: f64,
        threshold: f64,
        authenticity_confidence: f32,
    },
    Unresolved {
        /// Distinct 2–6 digit tokens in first-seen order, for manual follow-up.
        candidate_numbers: Vec<String>,
        /// Secondary fields that were still detected.
        fields: FieldCandidates,
        authenticity_confidence: f32,
    },
    Verified {
        fields: FieldCandidates,
        score: f64,
        source: MatchSource,
        authenticity_confidence: f32,
    },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Mismatch { .. } => "mismatch",
            Self::Unresolved { .. } => "unresolved",
            Self::Verified { .. } => "verified",
        }
    }

    pub fn authenticity_confidence(&self) -> f32 {
        match self {
            Self::Rejected {
                authenticity_confidence,
                ..
            }
            | Self::Mismatch {
                authenticity_confidence,
                ..
            }
            | Self::Unresolved {
                authenticity_confidence,
                ..
            }
            | Self::Verified {
                authenticity_confidence,
                ..
            } => *authenticity_confidence,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Collaborator traits
// ═══════════════════════════════════════════════════════════

/// Estimates whether an image is a genuine instance of the expected document.
pub trait AuthenticityOracle: Send + Sync {
    /// Confidence in `[0, 1]`.
    fn confidence(&self, image: &DocumentImage) -> Result<f32, VerificationError>;
}

/// OCR engine abstraction (allows mocking for tests).
///
/// The engine hands out sessions; a session owns the engine's working memory
/// and releases it when dropped.
pub trait OcrEngine: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn OcrSession>, VerificationError>;
}

pub trait OcrSession {
    fn recognize(
        &mut self,
        image: &NormalizedImage,
        mode: SegmentationMode,
    ) -> Result<OcrPageResult, VerificationError>;
}
