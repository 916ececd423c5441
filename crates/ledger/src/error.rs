//! Ledger errors

use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Ledger store error: {0}")]
    Backend(String),

    #[error("Ledger entry {key} still reserved by another order after {waited_ms}ms")]
    Contended { key: String, waited_ms: u64 },

    #[error("Ledger lock poisoned for {0}")]
    LockPoisoned(String),

    #[error("Ledger entry {0} changed outside the reservation")]
    ConcurrentModification(String),

    #[error("Reservation for {key} was rejected: {total_after}ml exceeds {limit}ml")]
    ReservationRejected {
        key: String,
        total_after: u64,
        limit: u64,
    },

    #[error("Volume overflow for {0}")]
    Overflow(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Storage could not answer: the caller must fail closed
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LedgerError::Timeout { .. } | LedgerError::Backend(_) | LedgerError::LockPoisoned(_)
        )
    }
}
