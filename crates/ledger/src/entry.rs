//! Ledger keys and rows

use chrono::NaiveDate;
use pourguard_core::Milliliters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(identity, operating day)` key of a ledger row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub identity_id: String,
    /// Calendar date in the service's operating timezone
    pub day: NaiveDate,
}

impl LedgerKey {
    /// Create a ledger key
    pub fn new(identity_id: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            identity_id: identity_id.into(),
            day,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity_id, self.day)
    }
}

/// Cumulative volume admitted for one identity on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLedgerEntry {
    pub identity_id: String,
    pub day: NaiveDate,
    pub cumulative_ml: Milliliters,
}

impl VolumeLedgerEntry {
    /// Build a row from its key
    pub fn new(key: &LedgerKey, cumulative_ml: Milliliters) -> Self {
        Self {
            identity_id: key.identity_id.clone(),
            day: key.day,
            cumulative_ml,
        }
    }

    /// Key of this row
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.identity_id.clone(), self.day)
    }
}
