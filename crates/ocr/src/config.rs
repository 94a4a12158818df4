use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the whole recognition run. Every section falls back to its
/// defaults when omitted from the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub scoring: ScoringConfig,
    pub trip_meter: TripMeterConfig,
}

impl PipelineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scoring;
        let weights = [
            ("digit_count", s.digit_count),
            ("range", s.range),
            ("confidence", s.confidence),
            ("area", s.area),
            ("prior_digit_count", s.prior_digit_count),
            ("prior_range", s.prior_range),
            ("prior_confidence", s.prior_confidence),
            ("prior_proximity", s.prior_proximity),
        ];
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(format!("scoring.{name} must be >= 0, got {w}")));
        }
        if s.digit_count + s.range + s.confidence <= 0.0 {
            return Err(ConfigError::Invalid("scoring weights without a prior sum to zero".into()));
        }
        if s.far_prior_scale <= 0.0 {
            return Err(ConfigError::Invalid("scoring.far_prior_scale must be > 0".into()));
        }
        let ratio = self.trip_meter.max_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "trip_meter.max_ratio must be in (0, 1), got {ratio}"
            )));
        }
        if self.preprocess.max_dimension == 0 {
            return Err(ConfigError::Invalid("preprocess.max_dimension must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Contrast adjustment for the contrast-enhanced variant (`image` units, -100..100).
    pub contrast: f32,
    pub sharpen_sigma: f32,
    pub sharpen_threshold: i32,
    /// Half-width of the local-mean window used for adaptive binarization.
    pub binarize_block_radius: u32,
    /// Subtracted from the local mean before thresholding.
    pub binarize_offset: i32,
    /// Longest side allowed for the document-enhanced variant.
    pub max_dimension: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            contrast: 40.0,
            sharpen_sigma: 1.5,
            sharpen_threshold: 3,
            binarize_block_radius: 15,
            binarize_offset: 10,
            max_dimension: 2800,
        }
    }
}

/// Weights of the candidate scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub digit_count: f64,
    pub range: f64,
    pub confidence: f64,
    /// Bonus for a bounding box as large as the largest one in the run.
    pub area: f64,
    pub prior_digit_count: f64,
    pub prior_range: f64,
    pub prior_confidence: f64,
    pub prior_proximity: f64,
    /// Readings at most this far above the prior get full proximity credit.
    pub near_prior_window: u32,
    /// Distance beyond the window at which proximity credit has halved.
    pub far_prior_scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            digit_count: 0.40,
            range: 0.25,
            confidence: 0.35,
            area: 0.15,
            prior_digit_count: 0.15,
            prior_range: 0.10,
            prior_confidence: 0.30,
            prior_proximity: 0.45,
            near_prior_window: 10_000,
            far_prior_scale: 25_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripMeterConfig {
    /// A reading below this fraction of the largest reading may be a trip meter.
    pub max_ratio: f64,
    /// ...but only when it also trails the largest reading by more than this.
    pub min_gap: u32,
}

impl Default for TripMeterConfig {
    fn default() -> Self {
        Self { max_ratio: 0.10, min_gap: 1_000 }
    }
}
