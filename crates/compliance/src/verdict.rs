//! Order-level verdicts and reason codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Why an order was denied
///
/// Variants are declared in check order; verdict reasons follow it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    AgeUnderMinimum,
    KycIncomplete,
    LocationNotVerified,
    RestrictedZone,
    OutsideServiceArea,
    DailyLimitExceeded,
    OutsideDeliveryHours,
}

/// Aggregated decision for one order. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    /// True iff `reasons` is empty
    pub allowed: bool,
    /// Every failing check
    pub reasons: Vec<ReasonCode>,
    pub checked_at: DateTime<Utc>,
}

impl ComplianceVerdict {
    /// Build a verdict from the failing checks
    pub fn from_reasons(mut reasons: Vec<ReasonCode>, checked_at: DateTime<Utc>) -> Self {
        reasons.sort();
        reasons.dedup();
        Self {
            allowed: reasons.is_empty(),
            reasons,
            checked_at,
        }
    }

    /// Whether a specific reason is present
    pub fn has_reason(&self, reason: ReasonCode) -> bool {
        self.reasons.contains(&reason)
    }

    /// Reason codes as wire strings
    pub fn reason_codes(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}
