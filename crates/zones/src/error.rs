//! Zone errors

use pourguard_core::CoreError;
use thiserror::Error;

/// Errors from zone loading and evaluation
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error(transparent)]
    Input(#[from] CoreError),

    #[error("Delivery zone {id} is invalid: {source}")]
    InvalidBoundary {
        id: String,
        #[source]
        source: CoreError,
    },

    #[error("Exclusion zone {id} has invalid radius {radius}")]
    InvalidRadius { id: String, radius: f64 },

    #[error("Duplicate zone id: {0}")]
    DuplicateZoneId(String),

    #[error("Zone source {source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for zone operations
pub type ZoneResult<T> = Result<T, ZoneError>;
