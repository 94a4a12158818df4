pub mod mileage;
pub mod units;

pub use mileage::{Mileage, MileageError};
pub use units::{DistanceUnit, KM_PER_MILE};
