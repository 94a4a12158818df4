pub mod aggregate;
pub mod config;
pub mod correct;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod score;
pub mod trip;
pub mod types;

pub use aggregate::{collect_candidates, select_reading, CandidateSet, RejectedReading};
pub use config::{ConfigError, PipelineConfig, PreprocessConfig, ScoringConfig, TripMeterConfig};
pub use correct::correct;
pub use extract::{detect_unit, extract_digit_runs};
pub use pipeline::{MileagePipeline, RecognitionError};
pub use preprocess::{load_image, preprocess, PreprocessError, PreprocessedImage};
pub use recognizer::{FnRecognizer, MockRecognizer, OcrError, ReplayRecognizer, TextRecognizer};
pub use score::{score, score_with};
pub use trip::TripMeterDiscriminator;
pub use types::{
    BoundingBox, Candidate, ObservationMetadata, PreprocessingMethod, RecognitionResult,
    TextObservation,
};
