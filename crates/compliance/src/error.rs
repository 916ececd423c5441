//! Compliance errors
//!
//! Only input and infrastructure problems are errors. A failed compliance
//! check is an ordinary verdict with reason codes.

use pourguard_core::CoreError;
use pourguard_ledger::LedgerError;
use pourguard_zones::ZoneError;
use thiserror::Error;

use crate::engine::Admission;

/// Errors from the Compliance Engine
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error(transparent)]
    Input(#[from] CoreError),

    #[error("Zone error: {0}")]
    Zone(ZoneError),

    #[error("Zone registry unavailable: {0}")]
    ZoneRegistryUnavailable(String),

    #[error("Volume ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Volume ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    #[error("Verification store error: {0}")]
    VerificationStore(String),

    #[error("KYC provider error: {0}")]
    KycProvider(String),

    #[error("Failed to write audit event: {0}")]
    AuditWrite(String),

    /// The order's volume is in the ledger but its events are not in the
    /// audit sink. Carries the admission so the caller does not retry it.
    #[error("Order for {identity_id} committed without audit events: {reason}")]
    AdmittedWithoutAudit {
        identity_id: String,
        admission: Box<Admission>,
        reason: String,
    },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ComplianceError {
    /// Infrastructure fault; the caller must fail closed
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ComplianceError::LedgerUnavailable(_)
                | ComplianceError::ZoneRegistryUnavailable(_)
                | ComplianceError::VerificationStore(_)
                | ComplianceError::KycProvider(_)
        )
    }
}

impl ComplianceError {
    /// Committed admission whose audit write failed
    pub fn admission(&self) -> Option<&Admission> {
        match self {
            ComplianceError::AdmittedWithoutAudit { admission, .. } => Some(admission),
            _ => None,
        }
    }

    /// Take the committed admission out of an audit failure
    pub fn into_admission(self) -> Option<Admission> {
        match self {
            ComplianceError::AdmittedWithoutAudit { admission, .. } => Some(*admission),
            _ => None,
        }
    }
}

impl From<LedgerError> for ComplianceError {
    fn from(err: LedgerError) -> Self {
        if err.is_unavailable() {
            ComplianceError::LedgerUnavailable(err.to_string())
        } else {
            ComplianceError::Ledger(err)
        }
    }
}

impl From<ZoneError> for ComplianceError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::Input(core) => ComplianceError::Input(core),
            ZoneError::Unavailable { .. } | ZoneError::IoError(_) => {
                ComplianceError::ZoneRegistryUnavailable(err.to_string())
            }
            other => ComplianceError::Zone(other),
        }
    }
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;
