//! Coordinate - validated WGS84 point in decimal degrees

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A point on the Earth's surface in decimal degrees.
///
/// # Invariant
/// Both components are finite, latitude is within [-90, 90] and longitude
/// within [-180, 180]. Deserialization goes through the same check.
///
/// # Example
/// ```
/// use pourguard_core::Coordinate;
///
/// let gangtok = Coordinate::new(27.3314, 88.6138).unwrap();
/// assert_eq!(gangtok.latitude(), 27.3314);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(latitude: f64, longitude: f64) -> CoreResult<Self> {
        let invalid = |reason| CoreError::InvalidCoordinate {
            latitude,
            longitude,
            reason,
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid("components must be finite"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("latitude out of range [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("longitude out of range [-180, 180]"));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees
    #[inline]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees
    #[inline]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        RawCoordinate {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}
