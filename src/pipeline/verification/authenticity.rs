use image::imageops::FilterType;

use super::types::{AuthenticityOracle, DocumentImage};
use super::VerificationError;

/// Square input edge expected by the document classifier.
pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

/// Reject NaN and values outside `[0, 1]` from an oracle.
pub fn validate_confidence(confidence: f32) -> Result<f32, VerificationError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(VerificationError::InvalidConfidence(confidence))
    }
}

/// Classifier input tensor in HWC order, values scaled to `[0, 1]`.
///
/// Nearest-neighbour resize to `CLASSIFIER_INPUT_SIZE` squared, matching how
/// the classifier was fed during training. An image with no pixels cannot
/// be resized and is refused.
pub fn classifier_input(image: &DocumentImage) -> Result<Vec<f32>, VerificationError> {
    let (width, height) = image.pixels().dimensions();
    if width == 0 || height == 0 {
        return Err(VerificationError::ImageProcessing(format!(
            "cannot classify an empty {width}x{height} image"
        )));
    }

    let resized = image::imageops::resize(
        image.pixels(),
        CLASSIFIER_INPUT_SIZE,
        CLASSIFIER_INPUT_SIZE,
        FilterType::Nearest,
    );
    Ok(resized
        .pixels()
        .flat_map(|p| p.0)
        .map(|c| c as f32 / 255.0)
        .collect())
}

/// Oracle that always reports the same confidence.
///
/// Stand-in for deployments without a trained classifier, and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidenceOracle {
    confidence: f32,
}

impl FixedConfidenceOracle {
    pub fn new(confidence: f32) -> Self {
        Self { confidence }
    }
}

impl AuthenticityOracle for FixedConfidenceOracle {
    fn confidence(&self, _image: &DocumentImage) -> Result<f32, VerificationError> {
        Ok(self.confidence)
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier (feature `onnx-classifier`)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-classifier")]
mod onnx {
    use super::{classifier_input, AuthenticityOracle, DocumentImage, VerificationError};
    use super::CLASSIFIER_INPUT_SIZE;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Two-class (forged, genuine) image classifier run through ONNX Runtime.
    ///
    /// Input `[1, 64, 64, 3]` f32, output `[1, 2]` softmax; the confidence is
    /// the genuine-class probability.
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires `&mut self`.
    pub struct OnnxAuthenticityClassifier {
        session: Mutex<Session>,
    }

    impl OnnxAuthenticityClassifier {
        pub fn load(model_path: &Path) -> Result<Self, VerificationError> {
            if !model_path.exists() {
                return Err(VerificationError::Classifier(format!(
                    "model not found: {}",
                    model_path.display()
                )));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| VerificationError::Classifier(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| VerificationError::Classifier(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    VerificationError::Classifier(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("Authenticity classifier loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl AuthenticityOracle for OnnxAuthenticityClassifier {
        fn confidence(&self, image: &DocumentImage) -> Result<f32, VerificationError> {
            use ort::value::TensorRef;

            let side = CLASSIFIER_INPUT_SIZE as usize;
            let pixels = classifier_input(image)?;
            let input = ndarray::Array4::from_shape_vec((1, side, side, 3), pixels)
                .map_err(|e| VerificationError::Classifier(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| VerificationError::Classifier(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| VerificationError::Classifier("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| VerificationError::Classifier(format!("ONNX inference failed: {e}")))?;

            let (shape, probabilities) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| VerificationError::Classifier(format!("Output extraction: {e}")))?;

            if probabilities.len() != 2 {
                return Err(VerificationError::Classifier(format!(
                    "Unexpected output shape: {shape:?}, expected [1, 2]"
                )));
            }

            Ok(probabilities[1])
        }
    }
}

#[cfg(feature = "onnx-classifier")]
pub use onnx::OnnxAuthenticityClassifier;
