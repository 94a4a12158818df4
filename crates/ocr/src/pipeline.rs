use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

use crate::aggregate::select_reading;
use crate::config::PipelineConfig;
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrError, TextRecognizer};
use crate::types::{PreprocessingMethod, RecognitionResult, TextObservation};

/// Why a photograph produced no reading. The first four are expected,
/// user-facing outcomes meant to be shown as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    #[error("Image processing failed: {0}")]
    ImageProcessingFailed(String),
    #[error("No text found in the image")]
    NoTextFound,
    #[error("No valid mileage found in the image")]
    NoValidMileageFound,
    #[error("Invalid mileage: {reason}")]
    InvalidMileage { reason: String },
    /// The runtime cancelled recognition work before it finished.
    #[error("Recognition was cancelled")]
    Cancelled,
}

impl RecognitionError {
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, RecognitionError::Cancelled)
    }
}

impl From<PreprocessError> for RecognitionError {
    fn from(e: PreprocessError) -> Self {
        RecognitionError::ImageProcessingFailed(e.to_string())
    }
}

/// What one preprocessing branch produced.
struct VariantOutcome {
    index: usize,
    method: PreprocessingMethod,
    observations: Result<Vec<TextObservation>, VariantFailure>,
}

enum VariantFailure {
    Preprocess(PreprocessError),
    Ocr(OcrError),
    Skipped,
}

/// Set when the owning future is dropped, so blocking work that has not
/// reached the recognizer yet can stop.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Orchestrates: preprocess → recognize (per variant, in parallel) →
/// correct → extract → discard trip meter → score → select.
///
/// Holds no state between calls apart from the recognizer and config.
pub struct MileagePipeline<R: TextRecognizer> {
    recognizer: Arc<R>,
    config: PipelineConfig,
}

impl<R: TextRecognizer + 'static> MileagePipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, PipelineConfig::default())
    }

    pub fn with_config(recognizer: R, config: PipelineConfig) -> Self {
        Self { recognizer: Arc::new(recognizer), config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recognize an image file on disk.
    pub async fn recognize_file(
        &self,
        path: &Path,
        prior: Option<u32>,
    ) -> Result<RecognitionResult, RecognitionError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RecognitionError::ImageProcessingFailed(format!("{}: {e}", path.display()))
        })?;
        self.recognize_bytes(&bytes, prior).await
    }

    /// Recognize encoded image bytes (from camera capture or file read).
    pub async fn recognize_bytes(
        &self,
        data: &[u8],
        prior: Option<u32>,
    ) -> Result<RecognitionResult, RecognitionError> {
        let data = data.to_vec();
        let image = tokio::task::spawn_blocking(move || preprocess::load_image(&data))
            .await
            .map_err(join_failure)??;
        self.recognize(image, prior).await
    }

    /// Recognize an already decoded, oriented and cropped image.
    #[tracing::instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub async fn recognize(
        &self,
        image: DynamicImage,
        prior: Option<u32>,
    ) -> Result<RecognitionResult, RecognitionError> {
        preprocess::ensure_non_empty(&image)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancelled));
        let image = Arc::new(image);

        // Dropping the set aborts any branch that has not started yet.
        let mut branches = JoinSet::new();
        for (index, method) in PreprocessingMethod::ALL.into_iter().enumerate() {
            let image = Arc::clone(&image);
            let recognizer = Arc::clone(&self.recognizer);
            let config = self.config.preprocess.clone();
            let cancelled = Arc::clone(&cancelled);

            branches.spawn_blocking(move || {
                let observations = run_variant(method, &image, &config, &*recognizer, &cancelled);
                VariantOutcome { index, method, observations }
            });
        }

        let mut outcomes = Vec::with_capacity(PreprocessingMethod::ALL.len());
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_cancelled() => return Err(RecognitionError::Cancelled),
                Err(e) => tracing::warn!("Recognition branch panicked: {e}"),
            }
        }

        // Merge in variant order so selection never depends on which branch finished first.
        outcomes.sort_by_key(|o| o.index);

        let mut observations = Vec::new();
        for outcome in outcomes {
            match outcome.observations {
                Ok(found) => {
                    tracing::debug!(method = %outcome.method, count = found.len(), "Variant recognized");
                    observations.extend(found);
                }
                Err(VariantFailure::Preprocess(e)) => {
                    tracing::warn!("Skipping {} variant: {e}", outcome.method)
                }
                Err(VariantFailure::Ocr(e)) => {
                    tracing::warn!("Recognition failed on {} variant: {e}", outcome.method)
                }
                Err(VariantFailure::Skipped) => return Err(RecognitionError::Cancelled),
            }
        }

        select_reading(&observations, prior, &self.config)
    }
}

fn run_variant<R: TextRecognizer + ?Sized>(
    method: PreprocessingMethod,
    image: &DynamicImage,
    config: &crate::config::PreprocessConfig,
    recognizer: &R,
    cancelled: &AtomicBool,
) -> Result<Vec<TextObservation>, VariantFailure> {
    if cancelled.load(Ordering::Relaxed) {
        return Err(VariantFailure::Skipped);
    }
    let variant = preprocess::apply(method, image, config).map_err(VariantFailure::Preprocess)?;
    if cancelled.load(Ordering::Relaxed) {
        return Err(VariantFailure::Skipped);
    }
    recognizer.recognize(&variant).map_err(VariantFailure::Ocr)
}

fn join_failure(e: JoinError) -> RecognitionError {
    if e.is_cancelled() {
        RecognitionError::Cancelled
    } else {
        RecognitionError::ImageProcessingFailed(format!("image decoding panicked: {e}"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
