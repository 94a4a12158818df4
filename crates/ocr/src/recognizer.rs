use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::types::TextObservation;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
    #[error("Failed to load recorded observations: {0}")]
    Replay(String),
}

/// Abstraction over a text recognition engine.
///
/// Called once per preprocessing variant, possibly from several blocking
/// threads at once. Observations may come back in any order.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Arc<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
        (**self).recognize(image)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns the same observations for every image.
pub struct MockRecognizer {
    pub observations: Vec<TextObservation>,
}

impl MockRecognizer {
    pub fn new(observations: Vec<TextObservation>) -> Self {
        Self { observations }
    }

    /// A single observation without geometry.
    pub fn from_text(text: impl Into<String>, confidence: f32) -> Self {
        Self::new(vec![TextObservation::new(text, confidence)])
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
        Ok(self.observations.clone())
    }
}

/// Delegates to a closure, so a fake can answer differently per variant.
pub struct FnRecognizer<F>(F);

impl<F> FnRecognizer<F>
where
    F: Fn(&DynamicImage) -> Result<Vec<TextObservation>, OcrError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> TextRecognizer for FnRecognizer<F>
where
    F: Fn(&DynamicImage) -> Result<Vec<TextObservation>, OcrError> + Send + Sync,
{
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
        (self.0)(image)
    }
}

// ── Replay backend ────────────────────────────────────────────────────────────

/// Replays observations recorded from a real engine as a JSON array of
/// `{ "text", "confidence", "bounding_box"? }` objects.
pub struct ReplayRecognizer {
    observations: Vec<TextObservation>,
}

impl ReplayRecognizer {
    pub fn from_json(json: &str) -> Result<Self, OcrError> {
        let observations =
            serde_json::from_str(json).map_err(|e| OcrError::Replay(e.to_string()))?;
        Ok(Self { observations })
    }

    pub fn load(path: &Path) -> Result<Self, OcrError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| OcrError::Replay(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn observations(&self) -> &[TextObservation] {
        &self.observations
    }
}

impl TextRecognizer for ReplayRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
        Ok(self.observations.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextRecognizer};
    use crate::preprocess::encode_png;
    use crate::types::TextObservation;
    use image::DynamicImage;
    use leptess::LepTess;

    /// Whole-image Tesseract recognition. Reports the engine's mean
    /// confidence and no geometry.
    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
            let png = encode_png(image).map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            let confidence = (lt.mean_text_conf() as f32 / 100.0).clamp(0.0, 1.0);

            Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| TextObservation::new(l, confidence))
                .collect())
        }
    }
}
