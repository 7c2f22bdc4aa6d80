use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::types::{
    NormalizedImage, OcrAttempt, OcrEngine, OcrPageResult, OcrSession, SegmentationMode,
};
use super::VerificationError;

// ═══════════════════════════════════════════════════════════
// Invocation policy
// ═══════════════════════════════════════════════════════════

/// Run OCR in sparse mode, falling back once to block mode when the text
/// is shorter than `min_text_length` characters. The block-mode result is
/// final even when it is short too.
pub fn recognize(
    session: &mut dyn OcrSession,
    image: &NormalizedImage,
    min_text_length: usize,
) -> Result<OcrAttempt, VerificationError> {
    let first = session.recognize(image, SegmentationMode::Sparse)?;
    let length = first.text.chars().count();
    debug!(mode = "sparse", length, confidence = first.confidence, "OCR pass complete");

    if length >= min_text_length {
        return Ok(OcrAttempt {
            mode: SegmentationMode::Sparse,
            text: first.text,
            length,
        });
    }

    info!(
        length,
        min_text_length, "Sparse OCR under-extracted, retrying in block mode"
    );
    let retry = session.recognize(image, SegmentationMode::Block)?;
    let length = retry.text.chars().count();
    debug!(mode = "block", length, confidence = retry.confidence, "OCR pass complete");

    Ok(OcrAttempt {
        mode: SegmentationMode::Block,
        text: retry.text,
        length,
    })
}

// ═══════════════════════════════════════════════════════════
// Tesseract
// ═══════════════════════════════════════════════════════════

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: std::path::PathBuf,
    lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Title deeds are Turkish; `tur.traineddata` is required.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, VerificationError> {
        if !tessdata_dir.join("tur.traineddata").exists() {
            return Err(VerificationError::OcrInit(format!(
                "tur.traineddata not found in {}",
                tessdata_dir.display()
            )));
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            lang: "tur".to_string(),
        })
    }

    /// Set language(s) for OCR (e.g., "tur", "tur+eng")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.lang = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn open_session(&self) -> Result<Box<dyn OcrSession>, VerificationError> {
        let tessdata = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| VerificationError::OcrInit("Invalid tessdata path".into()))?;
        let tess = tesseract::Tesseract::new(Some(tessdata), Some(&self.lang))
            .map_err(|e| VerificationError::OcrInit(format!("{e:?}")))?;
        debug!(lang = %self.lang, "Tesseract session opened");
        Ok(Box::new(TesseractSession { tess: Some(tess) }))
    }
}

/// One Tesseract API instance. Dropping it frees the engine's memory.
#[cfg(feature = "ocr")]
struct TesseractSession {
    tess: Option<tesseract::Tesseract>,
}

#[cfg(feature = "ocr")]
impl OcrSession for TesseractSession {
    fn recognize(
        &mut self,
        image: &NormalizedImage,
        mode: SegmentationMode,
    ) -> Result<OcrPageResult, VerificationError> {
        let png = image.to_png()?;
        // The builder API consumes the handle; it is put back on success only.
        let tess = self
            .tess
            .take()
            .ok_or_else(|| VerificationError::OcrProcessing("Tesseract session poisoned".into()))?;

        let tess = tess
            .set_variable("tessedit_pageseg_mode", mode.tesseract_psm())
            .map_err(|e| VerificationError::OcrProcessing(format!("{e:?}")))?;
        let mut tess = tess
            .set_image_from_mem(&png)
            .map_err(|e| VerificationError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| VerificationError::OcrProcessing(format!("{e:?}")))?;
        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        self.tess = Some(tess);

        Ok(OcrPageResult { text, confidence })
    }
}

#[cfg(feature = "ocr")]
impl Drop for TesseractSession {
    fn drop(&mut self) {
        debug!("Tesseract session released");
    }
}

// ═══════════════════════════════════════════════════════════
// Mock engine
// ═══════════════════════════════════════════════════════════

/// Shared counters for asserting how a mock engine was driven.
#[derive(Debug, Clone, Default)]
pub struct OcrCallLog {
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    modes: Arc<Mutex<Vec<SegmentationMode>>>,
}

impl OcrCallLog {
    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Modes passed to `recognize`, in call order.
    pub fn modes(&self) -> Vec<SegmentationMode> {
        self.modes.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn recognize_calls(&self) -> usize {
        self.modes().len()
    }
}

/// Mock OCR engine for unit testing without Tesseract.
#[derive(Debug, Clone)]
pub struct MockOcrEngine {
    sparse_text: String,
    block_text: Option<String>,
    failure: Option<String>,
    confidence: f32,
    log: OcrCallLog,
}

impl MockOcrEngine {
    /// Returns `text` for every mode.
    pub fn new(text: &str) -> Self {
        Self {
            sparse_text: text.to_string(),
            block_text: None,
            failure: None,
            confidence: 0.9,
            log: OcrCallLog::default(),
        }
    }

    /// Return different text for the block-mode retry.
    pub fn with_block_text(mut self, text: &str) -> Self {
        self.block_text = Some(text.to_string());
        self
    }

    /// Every `recognize` call fails with `OcrProcessing(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new("")
        }
    }

    pub fn log(&self) -> OcrCallLog {
        self.log.clone()
    }
}

impl OcrEngine for MockOcrEngine {
    fn open_session(&self) -> Result<Box<dyn OcrSession>, VerificationError> {
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockOcrSession {
            engine: self.clone(),
        }))
    }
}

struct MockOcrSession {
    engine: MockOcrEngine,
}

impl OcrSession for MockOcrSession {
    fn recognize(
        &mut self,
        _image: &NormalizedImage,
        mode: SegmentationMode,
    ) -> Result<OcrPageResult, VerificationError> {
        if let Ok(mut modes) = self.engine.log.modes.lock() {
            modes.push(mode);
        }
        if let Some(message) = &self.engine.failure {
            return Err(VerificationError::OcrProcessing(message.clone()));
        }

        let text = match (mode, &self.engine.block_text) {
            (SegmentationMode::Block, Some(block)) => block.clone(),
            _ => self.engine.sparse_text.clone(),
        };
        Ok(OcrPageResult {
            text,
            confidence: self.engine.confidence,
        })
    }
}

impl Drop for MockOcrSession {
    fn drop(&mut self) {
        self.engine.log.released.fetch_add(1, Ordering::SeqCst);
    }
}
