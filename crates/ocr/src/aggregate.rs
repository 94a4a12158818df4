use odoscan_core::Mileage;

use crate::config::PipelineConfig;
use crate::correct::correct;
use crate::extract::{detect_unit, extract_digit_runs};
use crate::pipeline::RecognitionError;
use crate::score::score_with;
use crate::trip::TripMeterDiscriminator;
use crate::types::{Candidate, ObservationMetadata, RecognitionResult, TextObservation};

/// A number that was read but fails the absolute sanity bound.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedReading {
    pub digits: String,
    pub raw_text: String,
    pub reason: String,
}

/// Every number read in a run, split by the sanity bound.
#[derive(Debug, Default)]
pub struct CandidateSet {
    pub valid: Vec<Candidate>,
    pub rejected: Vec<RejectedReading>,
}

/// Correct, extract and unit-tag every observation, in order.
pub fn collect_candidates(observations: &[TextObservation]) -> CandidateSet {
    let mut set = CandidateSet::default();

    for obs in observations {
        let corrected = correct(&obs.text);
        let unit = detect_unit(&obs.text).or_else(|| detect_unit(&corrected));
        let metadata = obs.bounding_box.map(ObservationMetadata::from);

        for digits in extract_digit_runs(&corrected) {
            match Mileage::parse_digits(&digits) {
                Ok(mileage) => {
                    let mut candidate =
                        Candidate::new(mileage, obs.confidence, obs.text.as_str()).with_unit(unit);
                    if let Some(meta) = metadata {
                        candidate = candidate.with_metadata(meta);
                    }
                    set.valid.push(candidate);
                }
                Err(e) => {
                    tracing::debug!("Rejecting reading from '{}': {e}", obs.text);
                    set.rejected.push(RejectedReading {
                        digits: digits.into_owned(),
                        raw_text: obs.text.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    set
}

/// Pick the single best reading from all observations of a run.
///
/// Observations must arrive in a deterministic order; ties go to the
/// earliest candidate.
pub fn select_reading(
    observations: &[TextObservation],
    prior: Option<u32>,
    config: &PipelineConfig,
) -> Result<RecognitionResult, RecognitionError> {
    if observations.is_empty() {
        return Err(RecognitionError::NoTextFound);
    }

    let CandidateSet { valid, rejected } = collect_candidates(observations);
    if valid.is_empty() {
        return Err(match rejected.into_iter().next() {
            Some(r) => RecognitionError::InvalidMileage { reason: r.reason },
            None => RecognitionError::NoValidMileageFound,
        });
    }

    let survivors = TripMeterDiscriminator::new(config.trip_meter.clone()).retain(valid);
    let max_area = survivors
        .iter()
        .filter_map(|c| c.metadata.map(|m| m.area))
        .fold(None, |acc: Option<f32>, a| Some(acc.map_or(a, |m| m.max(a))));

    let mut best: Option<(f64, Candidate)> = None;
    for candidate in survivors {
        let score = score_with(&config.scoring, &candidate, max_area, prior);
        tracing::debug!(mileage = candidate.mileage.value(), score, "Scored candidate");
        let better = match &best {
            None => true,
            Some((top, _)) => score > *top,
        };
        if better {
            best = Some((score, candidate));
        }
    }

    let Some((score, winner)) = best else {
        return Err(RecognitionError::NoValidMileageFound);
    };
    tracing::info!(mileage = winner.mileage.value(), score, "Selected odometer reading");

    Ok(RecognitionResult {
        mileage: winner.mileage,
        confidence: winner.confidence,
        raw_text: winner.raw_text,
        detected_unit: winner.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use odoscan_core::DistanceUnit;

    fn obs(text: &str, confidence: f32) -> TextObservation {
        TextObservation::new(text, confidence)
    }

    fn select(observations: &[TextObservation], prior: Option<u32>) -> Result<RecognitionResult, RecognitionError> {
        select_reading(observations, prior, &PipelineConfig::default())
    }

    #[test]
    fn no_observations_is_no_text_found() {
        assert_eq!(select(&[], None), Err(RecognitionError::NoTextFound));
    }

    #[test]
    fn labels_only_is_no_valid_mileage() {
        assert_eq!(
            select(&[obs("ODO", 0.9), obs("MILES", 0.9)], None),
            Err(RecognitionError::NoValidMileageFound)
        );
    }

    #[test]
    fn only_out_of_range_reading_is_invalid_mileage() {
        let err = select(&[obs("12345678", 0.9)], None).unwrap_err();
        assert!(matches!(err, RecognitionError::InvalidMileage { ref reason } if reason.contains("12345678")));
    }

    #[test]
    fn out_of_range_reading_is_ignored_when_a_valid_one_exists() {
        let r = select(&[obs("12345678", 0.9), obs("52347", 0.6)], None).unwrap();
        assert_eq!(r.mileage.value(), 52_347);
    }

    #[test]
    fn trip_meter_is_discarded() {
        let r = select(&[obs("TRIP 234", 0.99), obs("52347", 0.7)], None).unwrap();
        assert_eq!(r.mileage.value(), 52_347);
        assert_eq!(r.raw_text, "52347");
    }

    #[test]
    fn raw_text_is_the_uncorrected_observation() {
        let r = select(&[obs("ODO 5O347 mi", 0.8)], None).unwrap();
        assert_eq!(r.mileage.value(), 50_347);
        assert_eq!(r.raw_text, "ODO 5O347 mi");
        assert_eq!(r.detected_unit, Some(DistanceUnit::Miles));
        assert!((r.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn unit_from_separate_observation_is_ignored() {
        let r = select(&[obs("52347", 0.8), obs("km", 0.9)], None).unwrap();
        assert_eq!(r.detected_unit, None);
    }

    #[test]
    fn speed_label_does_not_set_the_odometer_unit() {
        let r = select(&[obs("ODO 52347", 0.8), obs("120 km/h", 0.9)], None).unwrap();
        assert_eq!(r.mileage.value(), 52_347);
        assert_eq!(r.raw_text, "ODO 52347");
        assert_eq!(r.detected_unit, None);
    }

    #[test]
    fn no_unit_anywhere_is_none() {
        assert_eq!(select(&[obs("52347", 0.8)], None).unwrap().detected_unit, None);
    }

    #[test]
    fn thousands_grouped_reading_wins() {
        let r = select(&[obs("52,347 km", 0.8)], None).unwrap();
        assert_eq!(r.mileage.value(), 52_347);
    }

    #[test]
    fn prior_steers_between_plausible_readings() {
        let observations = [obs("52347", 0.7), obs("48000", 0.9)];
        assert_eq!(select(&observations, None).unwrap().mileage.value(), 48_000);
        assert_eq!(select(&observations, Some(50_000)).unwrap().mileage.value(), 52_347);
    }

    #[test]
    fn larger_text_wins_between_close_readings() {
        let observations = [
            obs("52350", 0.75).with_bounding_box(BoundingBox::new(0.1, 0.7, 0.2, 0.05)),
            obs("52347", 0.70).with_bounding_box(BoundingBox::new(0.1, 0.3, 0.6, 0.3)),
        ];
        assert_eq!(select(&observations, None).unwrap().mileage.value(), 52_347);
    }

    #[test]
    fn ties_go_to_the_earliest_candidate() {
        let r = select(&[obs("52347", 0.8), obs("52350", 0.8)], None).unwrap();
        assert_eq!(r.mileage.value(), 52_347);
    }

    #[test]
    fn collect_keeps_geometry_and_unit() {
        let set = collect_candidates(&[
            obs("52347 mi", 0.8).with_bounding_box(BoundingBox::new(0.0, 0.0, 0.5, 0.5)),
        ]);
        assert_eq!(set.valid.len(), 1);
        assert_eq!(set.valid[0].unit, Some(DistanceUnit::Miles));
        assert!((set.valid[0].metadata.unwrap().area - 0.25).abs() < 1e-6);
        assert!(set.rejected.is_empty());
    }

    #[test]
    fn collect_rejects_runs_beyond_the_bound() {
        let set = collect_candidates(&[obs("ODO 123456789012345678901234567890", 0.9)]);
        assert!(set.valid.is_empty());
        assert_eq!(set.rejected.len(), 1);
        assert_eq!(set.rejected[0].digits, "123456789012345678901234567890");
        assert!(set.rejected[0].reason.contains(&u64::MAX.to_string()));
    }
}
