use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilometres in one statute mile.
pub const KM_PER_MILE: f64 = 1.609_344;

/// The distance unit an odometer reads in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn abbreviation(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }

    /// Convert a distance between units.
    pub fn convert(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
        match (from, to) {
            (DistanceUnit::Miles, DistanceUnit::Kilometers) => value * KM_PER_MILE,
            (DistanceUnit::Kilometers, DistanceUnit::Miles) => value / KM_PER_MILE,
            _ => value,
        }
    }

    /// Convert a whole-number odometer reading, rounding to the nearest unit.
    pub fn convert_mileage(value: u32, from: DistanceUnit, to: DistanceUnit) -> u32 {
        Self::convert(value as f64, from, to).round() as u32
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kms" | "kilometer" | "kilometers" => Ok(DistanceUnit::Kilometers),
            other => Err(format!("Unknown distance unit: '{other}'")),
        }
    }
}
