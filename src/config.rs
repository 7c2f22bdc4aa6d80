//! Application constants and the tunable verification configuration.
//!
//! Every heuristic constant used by the pipeline lives here so it can be
//! recalibrated per document type without touching control flow. Overrides
//! are plain JSON; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::pipeline::verification::VerificationError;

/// Application-level constants
pub const APP_NAME: &str = "tapu-verify";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "tapu_verify=info,warn"
}

/// Default decision thresholds.
pub mod thresholds {
    /// Authenticity confidence required before any OCR is attempted.
    pub const AUTHENTICITY: f32 = 0.80;

    /// Match score required for a verified Ada number.
    pub const MATCH: f64 = 0.90;

    /// OCR output shorter than this (in characters) triggers the block-mode retry.
    pub const MIN_OCR_TEXT_LENGTH: usize = 100;

    /// Numeric hints surfaced when the Ada number cannot be located.
    pub const MAX_CANDIDATE_NUMBERS: usize = 10;
}

// ═══════════════════════════════════════════════════════════
// Normalizer
// ═══════════════════════════════════════════════════════════

/// Background accent colour forced to white before binarization.
///
/// A pixel is an accent when every channel exceeds its minimum and red
/// dominates both green and blue (the pink guilloche of title deeds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccentColorRule {
    pub min_red: u8,
    pub min_green: u8,
    pub min_blue: u8,
}

impl Default for AccentColorRule {
    fn default() -> Self {
        Self {
            min_red: 150,
            min_green: 100,
            min_blue: 100,
        }
    }
}

impl AccentColorRule {
    pub fn matches(&self, [r, g, b]: [u8; 3]) -> bool {
        r > self.min_red && g > self.min_green && b > self.min_blue && r > g && r > b
    }
}

/// Image normalizer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Integer upscale applied before thresholding.
    pub upscale_factor: u32,
    /// Subtracted from mean luminance to get the binarization threshold.
    pub luminance_offset: f32,
    pub threshold_floor: f32,
    pub threshold_ceiling: f32,
    pub accent: AccentColorRule,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            upscale_factor: 2,
            luminance_offset: 20.0,
            threshold_floor: 100.0,
            threshold_ceiling: 180.0,
            accent: AccentColorRule::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Verifier
// ═══════════════════════════════════════════════════════════

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub normalizer: NormalizerConfig,
    pub min_ocr_text_length: usize,
    pub authenticity_threshold: f32,
    pub match_threshold: f64,
    pub max_candidate_numbers: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            min_ocr_text_length: thresholds::MIN_OCR_TEXT_LENGTH,
            authenticity_threshold: thresholds::AUTHENTICITY,
            match_threshold: thresholds::MATCH,
            max_candidate_numbers: thresholds::MAX_CANDIDATE_NUMBERS,
        }
    }
}

impl VerifierConfig {
    /// Parse a JSON override document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, VerificationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| VerificationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, VerificationError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            VerificationError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if !(0.0..=1.0).contains(&self.authenticity_threshold) {
            return Err(VerificationError::Config(format!(
                "authenticity_threshold must be within [0, 1], got {}",
                self.authenticity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(VerificationError::Config(format!(
                "match_threshold must be within [0, 1], got {}",
                self.match_threshold
            )));
        }
        let n = &self.normalizer;
        if n.upscale_factor == 0 {
            return Err(VerificationError::Config(
                "upscale_factor must be at least 1".into(),
            ));
        }
        if n.threshold_floor > n.threshold_ceiling {
            return Err(VerificationError::Config(format!(
                "threshold_floor ({}) exceeds threshold_ceiling ({})",
                n.threshold_floor, n.threshold_ceiling
            )));
        }
        Ok(())
    }
}
