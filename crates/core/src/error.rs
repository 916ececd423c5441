//! Input errors
//!
//! These are rejected synchronously, before any compliance check runs.

use thiserror::Error;

/// Errors raised for malformed input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid geometry: polygon needs at least 3 points, got {points}")]
    InvalidGeometry { points: usize },

    #[error("Invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: &'static str,
    },
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid date error
    pub fn invalid_date(reason: impl Into<String>) -> Self {
        CoreError::InvalidDate(reason.into())
    }
}
