//! Plausibility scoring for mileage candidates.
//!
//! Without a prior the score is
//! `0.40·digit_count + 0.25·range + 0.35·confidence`, plus an optional area
//! bonus. With a prior, weight shifts to how well the reading follows on
//! from it.

use odoscan_core::Mileage;

use crate::config::ScoringConfig;
use crate::types::Candidate;

/// Readings inside this band are typical for a vehicle on the road.
const TYPICAL_RANGE: (u32, u32) = (10_000, 300_000);
/// Range plausibility at zero and at `Mileage::MAX`.
const RANGE_FLOOR: f64 = 0.1;
/// Best proximity credit for a reading below the prior.
const BELOW_PRIOR_CEILING: f64 = 0.3;
/// Least proximity credit for a reading above the prior.
const ABOVE_PRIOR_FLOOR: f64 = 0.35;

/// Score with the default weights.
pub fn score(candidate: &Candidate, max_area: Option<f32>, prior: Option<u32>) -> f64 {
    score_with(&ScoringConfig::default(), candidate, max_area, prior)
}

pub fn score_with(
    weights: &ScoringConfig,
    candidate: &Candidate,
    max_area: Option<f32>,
    prior: Option<u32>,
) -> f64 {
    let mileage = candidate.mileage.value();
    let confidence = candidate.confidence.clamp(0.0, 1.0) as f64;
    let digits = digit_count_plausibility(candidate.mileage);
    let range = range_plausibility(mileage);

    let base = match prior {
        None => {
            weights.digit_count * digits + weights.range * range + weights.confidence * confidence
        }
        Some(prior) => {
            weights.prior_digit_count * digits
                + weights.prior_range * range
                + weights.prior_confidence * confidence
                + weights.prior_proximity * prior_proximity(mileage, prior, weights)
        }
    };

    base + weights.area * area_ratio(candidate, max_area)
}

/// How typical the number of digits is for an odometer.
pub fn digit_count_plausibility(mileage: Mileage) -> f64 {
    match mileage.digit_count() {
        1 => 0.05,
        2 => 0.1,
        3 => 0.3,
        4 => 0.6,
        5 | 6 => 1.0,
        7 => 0.2,
        _ => 0.05,
    }
}

/// 1.0 inside the typical band, falling linearly towards `RANGE_FLOOR` at
/// zero and at `Mileage::MAX`.
pub fn range_plausibility(mileage: u32) -> f64 {
    let (low, high) = TYPICAL_RANGE;
    if mileage < low {
        RANGE_FLOOR + (1.0 - RANGE_FLOOR) * mileage as f64 / low as f64
    } else if mileage <= high {
        1.0
    } else {
        let span = (Mileage::MAX - high) as f64;
        let over = ((mileage - high) as f64).min(span);
        1.0 - (1.0 - RANGE_FLOOR) * over / span
    }
}

/// How well `mileage` follows on from `prior`. Odometers only count up, so
/// any reading below the prior earns less than the furthest reading above it.
pub fn prior_proximity(mileage: u32, prior: u32, weights: &ScoringConfig) -> f64 {
    if mileage >= prior {
        let delta = mileage - prior;
        if delta <= weights.near_prior_window {
            return 1.0;
        }
        let excess = (delta - weights.near_prior_window) as f64;
        (1.0 / (1.0 + excess / weights.far_prior_scale)).max(ABOVE_PRIOR_FLOOR)
    } else {
        let deficit = (prior - mileage) as f64;
        BELOW_PRIOR_CEILING * (1.0 - deficit / prior as f64)
    }
}

/// Relative size of the candidate's text against the largest in the run;
/// zero when either side is unknown.
fn area_ratio(candidate: &Candidate, max_area: Option<f32>) -> f64 {
    match (candidate.metadata, max_area) {
        (Some(meta), Some(max)) if max > 0.0 => (meta.area / max).clamp(0.0, 1.0) as f64,
        _ => 0.0,
    }
}
