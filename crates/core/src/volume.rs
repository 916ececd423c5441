//! Milliliters - regulated volume quantity
//!
//! Volumes are whole milliliters and can never be negative, which the
//! unsigned representation enforces at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// A quantity of regulated goods in milliliters.
///
/// # Example
/// ```
/// use pourguard_core::Milliliters;
///
/// let bottle = Milliliters::new(750);
/// let total = bottle.checked_add(Milliliters::new(500)).unwrap();
/// assert_eq!(total.value(), 1250);
/// assert!(total <= Milliliters::from_liters(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliliters(u64);

impl Milliliters {
    /// Zero volume constant
    pub const ZERO: Self = Self(0);

    /// Create a volume from a whole number of milliliters
    #[inline]
    pub const fn new(ml: u64) -> Self {
        Self(ml)
    }

    /// Create a volume from whole liters
    #[inline]
    pub const fn from_liters(liters: u64) -> Self {
        Self(liters * 1000)
    }

    /// Get the inner value in milliliters
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if the volume is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: Milliliters) -> Option<Milliliters> {
        self.0.checked_add(other.0).map(Milliliters)
    }

    /// Subtraction that stops at zero
    pub fn saturating_sub(&self, other: Milliliters) -> Milliliters {
        Milliliters(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Milliliters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ml", self.0)
    }
}

impl From<u64> for Milliliters {
    fn from(ml: u64) -> Self {
        Self(ml)
    }
}

impl From<Milliliters> for u64 {
    fn from(volume: Milliliters) -> Self {
        volume.0
    }
}

impl Default for Milliliters {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Sum for Milliliters {
    fn sum<I: Iterator<Item = Milliliters>>(iter: I) -> Self {
        Milliliters(iter.map(|v| v.0).fold(0u64, u64::saturating_add))
    }
}
