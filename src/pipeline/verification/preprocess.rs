//! Image normalization for text legibility.
//!
//! Pure image-to-image transform: upscale, measure brightness, strip the
//! coloured background pattern, binarize. No I/O, deterministic.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use tracing::debug;

use super::types::{DocumentImage, NormalizedImage};
use super::VerificationError;
use crate::config::NormalizerConfig;

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Validate image bytes before decoding.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), VerificationError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(VerificationError::ImageDecode(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(VerificationError::ImageDecode(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Decode raw bytes into a `DocumentImage` (RGB).
pub fn decode_document(bytes: &[u8]) -> Result<DocumentImage, VerificationError> {
    validate_image_bytes(bytes)?;
    let img = image::load_from_memory(bytes)
        .map_err(|e| VerificationError::ImageDecode(format!("Failed to decode image: {e}")))?;
    Ok(DocumentImage::from_rgb(img.to_rgb8()))
}

/// ITU-R BT.601 luma.
pub fn luminance([r, g, b]: [u8; 3]) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// `clamp(mean - offset, floor, ceiling)`
pub fn adaptive_threshold(mean_luminance: f32, config: &NormalizerConfig) -> f32 {
    (mean_luminance - config.luminance_offset)
        .max(config.threshold_floor)
        .min(config.threshold_ceiling)
}

/// Upscale and binarize a document for OCR.
///
/// Accent-coloured background pixels are forced white; every other pixel is
/// black when its luminance falls below the adaptive threshold.
pub fn normalize(image: &DocumentImage, config: &NormalizerConfig) -> NormalizedImage {
    let factor = config.upscale_factor.max(1);
    let src = image.pixels();
    let (w, h) = (
        src.width().saturating_mul(factor),
        src.height().saturating_mul(factor),
    );

    if w == 0 || h == 0 {
        return NormalizedImage {
            image: RgbImage::new(w, h),
            threshold: config.threshold_floor,
            mean_luminance: 0.0,
        };
    }

    // Catmull-Rom: sharper than bilinear without Lanczos ringing on glyph edges.
    let mut canvas = if factor == 1 {
        src.clone()
    } else {
        image::imageops::resize(src, w, h, FilterType::CatmullRom)
    };

    let pixel_count = w as f64 * h as f64;
    let total: f64 = canvas.pixels().map(|p| luminance(p.0) as f64).sum();
    let mean_luminance = (total / pixel_count) as f32;
    let threshold = adaptive_threshold(mean_luminance, config);

    let mut accent_pixels = 0usize;
    for px in canvas.pixels_mut() {
        let value = if config.accent.matches(px.0) {
            accent_pixels += 1;
            WHITE
        } else if luminance(px.0) < threshold {
            BLACK
        } else {
            WHITE
        };
        *px = Rgb([value, value, value]);
    }

    debug!(
        original = format!("{}x{}", src.width(), src.height()),
        output = format!("{w}x{h}"),
        mean_luminance,
        threshold,
        accent_pixels,
        "Document normalized for OCR"
    );

    NormalizedImage {
        image: canvas,
        threshold,
        mean_luminance,
    }
}

impl NormalizedImage {
    /// Lossless PNG encoding for engines that consume encoded bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, VerificationError> {
        encode_png(&self.image)
    }
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, VerificationError> {
    let dynamic = DynamicImage::ImageRgb8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| VerificationError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccentColorRule;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DocumentImage {
        DocumentImage::from_rgb(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn assert_binary(img: &NormalizedImage) {
        for px in img.image.pixels() {
            for &c in &px.0 {
                assert!(c == BLACK || c == WHITE, "non-binary channel {c}");
            }
        }
    }

    #[test]
    fn output_is_binary_for_gradient() {
        let src = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });
        let out = normalize(&DocumentImage::from_rgb(src), &NormalizerConfig::default());
        assert_binary(&out);
    }

    #[test]
    fn output_is_upscaled_by_factor() {
        let out = normalize(&solid(10, 7, [255, 255, 255]), &NormalizerConfig::default());
        assert_eq!(out.image.dimensions(), (20, 14));

        let config = NormalizerConfig {
            upscale_factor: 3,
            ..NormalizerConfig::default()
        };
        let out = normalize(&solid(10, 7, [255, 255, 255]), &config);
        assert_eq!(out.image.dimensions(), (30, 21));
    }

    #[test]
    fn white_page_clamps_to_ceiling() {
        let out = normalize(&solid(8, 8, [255, 255, 255]), &NormalizerConfig::default());
        assert!((out.threshold - 180.0).abs() < 1e-3);
        assert!(out.image.pixels().all(|p| p.0 == [WHITE; 3]));
    }

    #[test]
    fn black_page_clamps_to_floor() {
        let out = normalize(&solid(8, 8, [0, 0, 0]), &NormalizerConfig::default());
        assert!((out.threshold - 100.0).abs() < 1e-3);
        assert!(out.image.pixels().all(|p| p.0 == [BLACK; 3]));
    }

    #[test]
    fn mid_grey_threshold_tracks_mean() {
        // luminance 150 -> threshold 130, inside the clamp range
        let out = normalize(&solid(8, 8, [150, 150, 150]), &NormalizerConfig::default());
        assert!((out.mean_luminance - 150.0).abs() < 1.5);
        assert!((out.threshold - 130.0).abs() < 1.5);
        assert!(out.image.pixels().all(|p| p.0 == [WHITE; 3]));
    }

    fn pink_and_white() -> DocumentImage {
        // Left half pink (luminance ~145), right half white: threshold clamps to 180,
        // so the pink would binarize to black without the accent rule.
        DocumentImage::from_rgb(RgbImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                Rgb([200, 120, 130])
            } else {
                Rgb([255, 255, 255])
            }
        }))
    }

    #[test]
    fn accent_background_forced_white() {
        let out = normalize(&pink_and_white(), &NormalizerConfig::default());
        assert_eq!(out.image.get_pixel(2, 8).0, [WHITE; 3]);
        assert_binary(&out);
    }

    #[test]
    fn accent_rule_disabled_keeps_pink_dark() {
        let config = NormalizerConfig {
            accent: AccentColorRule {
                min_red: 255,
                ..AccentColorRule::default()
            },
            ..NormalizerConfig::default()
        };
        let out = normalize(&pink_and_white(), &config);
        assert_eq!(out.image.get_pixel(2, 8).0, [BLACK; 3]);
    }

    #[test]
    fn dark_text_on_light_page_turns_black() {
        let src = RgbImage::from_fn(20, 20, |x, y| {
            if (8..12).contains(&x) && (8..12).contains(&y) {
                Rgb([30, 30, 30])
            } else {
                Rgb([235, 235, 235])
            }
        });
        let out = normalize(&DocumentImage::from_rgb(src), &NormalizerConfig::default());
        assert_eq!(out.image.get_pixel(20, 20).0, [BLACK; 3]);
        assert_eq!(out.image.get_pixel(2, 2).0, [WHITE; 3]);
    }

    #[test]
    fn normalization_is_deterministic() {
        let src = RgbImage::from_fn(12, 9, |x, y| Rgb([(x * 20) as u8, (y * 25) as u8, 90]));
        let doc = DocumentImage::from_rgb(src);
        let a = normalize(&doc, &NormalizerConfig::default());
        let b = normalize(&doc, &NormalizerConfig::default());
        assert_eq!(a.image, b.image);
        assert!((a.threshold - b.threshold).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_image_yields_empty_output() {
        let out = normalize(
            &DocumentImage::from_rgb(RgbImage::new(0, 0)),
            &NormalizerConfig::default(),
        );
        assert_eq!(out.image.dimensions(), (0, 0));
        assert!((out.threshold - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn decode_round_trips_png() {
        let bytes = encode_png(&RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]))).unwrap();
        let doc = DocumentImage::decode(&bytes).unwrap();
        assert_eq!((doc.width(), doc.height()), (16, 16));
        assert_eq!(doc.pixels().get_pixel(3, 3).0, [10, 20, 30]);
    }

    #[test]
    fn decode_rejects_tiny_input() {
        let err = DocumentImage::decode(b"tiny").unwrap_err();
        assert!(matches!(err, VerificationError::ImageDecode(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = DocumentImage::decode(&[0x42; 256]).unwrap_err();
        assert!(err.to_string().contains("Failed to decode image"));
    }

    #[test]
    fn normalized_png_is_decodable() {
        let out = normalize(&solid(8, 8, [255, 255, 255]), &NormalizerConfig::default());
        let bytes = out.to_png().unwrap();
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (16, 16));
    }
}
