//! Pourguard Core - Domain types and pure evaluators
//!
//! This crate contains the building blocks shared by every other crate:
//! - `Coordinate`: validated WGS84 point
//! - `Milliliters`: non-negative regulated volume
//! - [`geo`]: haversine distance and point-in-polygon containment
//! - [`age`]: age-from-birthdate with a minimum-age gate
//!
//! Everything here is pure computation. No I/O, no shared state.

pub mod age;
pub mod coordinate;
pub mod error;
pub mod geo;
pub mod volume;

pub use age::{evaluate_age, parse_date_of_birth, AgeVerdict};
pub use coordinate::Coordinate;
pub use error::{CoreError, CoreResult};
pub use geo::{contains_point, distance_meters, EARTH_RADIUS_METERS};
pub use volume::Milliliters;
