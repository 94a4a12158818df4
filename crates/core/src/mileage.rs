use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MileageError {
    #[error("Mileage {value} exceeds the maximum of {max}")]
    OutOfRange { value: u64, max: u32 },
    #[error("Not a numeric reading: '{0}'")]
    NotNumeric(String),
}

/// An odometer reading within the absolute sanity bound `[0, Mileage::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u32")]
pub struct Mileage(u32);

impl Mileage {
    pub const MAX: u32 = 1_000_000;

    pub fn new(value: u64) -> Result<Self, MileageError> {
        if value > Self::MAX as u64 {
            return Err(MileageError::OutOfRange { value, max: Self::MAX });
        }
        Ok(Mileage(value as u32))
    }

    /// Parse a run of ASCII digits of any length. Runs too long for `u64`
    /// report a saturated value.
    pub fn parse_digits(digits: &str) -> Result<Self, MileageError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MileageError::NotNumeric(digits.to_string()));
        }
        let value = digits
            .bytes()
            .try_fold(0u64, |acc, b| acc.checked_mul(10)?.checked_add((b - b'0') as u64))
            .unwrap_or(u64::MAX);
        Self::new(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Number of decimal digits in the reading (`0` has one digit).
    pub fn digit_count(self) -> u32 {
        self.0.checked_ilog10().map_or(1, |n| n + 1)
    }
}

impl TryFrom<u64> for Mileage {
    type Error = MileageError;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Mileage::new(value)
    }
}

impl From<Mileage> for u32 {
    fn from(m: Mileage) -> u32 {
        m.0
    }
}

impl fmt::Display for Mileage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        f.write_str(&out)
    }
}
