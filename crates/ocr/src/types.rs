use odoscan_core::{DistanceUnit, Mileage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle in normalized image coordinates (`[0, 1] × [0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Build a box, clipping it to the unit square.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: width.clamp(0.0, 1.0 - x),
            height: height.clamp(0.0, 1.0 - y),
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One unit of output from a text recognition backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObservation {
    pub text: String,
    /// Engine confidence (0.0–1.0).
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl TextObservation {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bounding_box: None,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

/// Geometry attached to a candidate when the backend reports a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationMetadata {
    pub bounding_box: BoundingBox,
    pub area: f32,
}

impl From<BoundingBox> for ObservationMetadata {
    fn from(bounding_box: BoundingBox) -> Self {
        Self { bounding_box, area: bounding_box.area() }
    }
}

/// The closed set of image variants produced before recognition.
/// `Original` always comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingMethod {
    Original,
    ContrastEnhanced,
    GrayscaleSharpened,
    DocumentEnhanced,
    AdaptiveBinarized,
}

impl PreprocessingMethod {
    pub const ALL: [PreprocessingMethod; 5] = [
        PreprocessingMethod::Original,
        PreprocessingMethod::ContrastEnhanced,
        PreprocessingMethod::GrayscaleSharpened,
        PreprocessingMethod::DocumentEnhanced,
        PreprocessingMethod::AdaptiveBinarized,
    ];
}

impl fmt::Display for PreprocessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingMethod::Original => write!(f, "original"),
            PreprocessingMethod::ContrastEnhanced => write!(f, "contrast_enhanced"),
            PreprocessingMethod::GrayscaleSharpened => write!(f, "grayscale_sharpened"),
            PreprocessingMethod::DocumentEnhanced => write!(f, "document_enhanced"),
            PreprocessingMethod::AdaptiveBinarized => write!(f, "adaptive_binarized"),
        }
    }
}

/// A numeric reading eligible for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub mileage: Mileage,
    pub confidence: f32,
    /// The uncorrected text of the observation the reading came from.
    pub raw_text: String,
    pub metadata: Option<ObservationMetadata>,
    pub unit: Option<DistanceUnit>,
}

impl Candidate {
    pub fn new(mileage: Mileage, confidence: f32, raw_text: impl Into<String>) -> Self {
        Self {
            mileage,
            confidence: confidence.clamp(0.0, 1.0),
            raw_text: raw_text.into(),
            metadata: None,
            unit: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ObservationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_unit(mut self, unit: Option<DistanceUnit>) -> Self {
        self.unit = unit;
        self
    }
}

/// The pipeline's answer for one photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub mileage: Mileage,
    /// Confidence of the observation the reading came from (0.0–1.0).
    pub confidence: f32,
    pub raw_text: String,
    /// `None` when no unit token was read; callers apply their own default.
    pub detected_unit: Option<DistanceUnit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_clipped_to_unit_square() {
        let b = BoundingBox::new(0.8, -0.2, 0.5, 0.5);
        assert_eq!(b.x, 0.8);
        assert_eq!(b.y, 0.0);
        assert!((b.width - 0.2).abs() < 1e-6);
        assert_eq!(b.height, 0.5);
    }

    #[test]
    fn metadata_area_is_width_times_height() {
        let meta = ObservationMetadata::from(BoundingBox::new(0.1, 0.1, 0.5, 0.2));
        assert!((meta.area - 0.1).abs() < 1e-6);
    }

    #[test]
    fn observation_clamps_confidence() {
        assert_eq!(TextObservation::new("x", 1.4).confidence, 1.0);
        assert_eq!(TextObservation::new("x", -0.3).confidence, 0.0);
    }

    #[test]
    fn original_is_first_of_five_methods() {
        assert_eq!(PreprocessingMethod::ALL.len(), 5);
        assert_eq!(PreprocessingMethod::ALL[0], PreprocessingMethod::Original);
    }

    #[test]
    fn method_display_matches_serde_name() {
        for method in PreprocessingMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{method}\""));
        }
    }

    #[test]
    fn observation_deserializes_without_geometry() {
        let obs: TextObservation =
            serde_json::from_str(r#"{"text":"52347","confidence":0.8}"#).unwrap();
        assert_eq!(obs.bounding_box, None);
    }

    #[test]
    fn result_serializes_mileage_as_number() {
        let result = RecognitionResult {
            mileage: Mileage::new(52_347).unwrap(),
            confidence: 0.5,
            raw_text: "52347 km".into(),
            detected_unit: Some(DistanceUnit::Kilometers),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mileage"], 52_347);
        assert_eq!(json["detected_unit"], "kilometers");
    }
}
