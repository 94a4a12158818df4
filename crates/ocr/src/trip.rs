use crate::config::TripMeterConfig;
use crate::types::Candidate;

/// Drops readings that look like a trip meter shown next to the odometer.
pub struct TripMeterDiscriminator {
    config: TripMeterConfig,
}

impl Default for TripMeterDiscriminator {
    fn default() -> Self {
        Self::new(TripMeterConfig::default())
    }
}

impl TripMeterDiscriminator {
    pub fn new(config: TripMeterConfig) -> Self {
        Self { config }
    }

    /// Keep every candidate except those far below the largest reading.
    /// Sets of fewer than two are returned as-is; order is preserved.
    pub fn retain(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if candidates.len() < 2 {
            return candidates;
        }
        let Some(max) = candidates.iter().map(|c| c.mileage.value()).max() else {
            return candidates;
        };
        candidates
            .into_iter()
            .filter(|c| {
                let trip = self.is_trip_reading(c.mileage.value(), max);
                if trip {
                    tracing::debug!("Discarding trip-meter reading {} (max {max})", c.mileage);
                }
                !trip
            })
            .collect()
    }

    /// Both conditions must hold: below `max_ratio` of the largest reading,
    /// and more than `min_gap` short of it.
    pub fn is_trip_reading(&self, mileage: u32, max: u32) -> bool {
        (mileage as f64) < max as f64 * self.config.max_ratio
            && max.saturating_sub(mileage) > self.config.min_gap
    }
}
