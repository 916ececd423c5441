//! Compliance events (written to the audit trail)
//!
//! One event per compliance decision. Events are append-only and never
//! updated after they are emitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which check produced an event
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    AgeCheck,
    LocationCheck,
    KycCheck,
    VolumeCheck,
    OrderAdmission,
}

/// Check outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// `Success` when `passed`
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A single audited compliance decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvent {
    pub id: String,
    pub event_type: EventType,
    pub identity_id: String,
    pub outcome: Outcome,
    /// Check-specific payload
    #[serde(default)]
    pub detail: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl ComplianceEvent {
    /// Event id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the check passed
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Whether the event falls inside `[start, end]`
    pub fn occurred_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.occurred_at >= start && self.occurred_at <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization() {
        let event = ComplianceEvent {
            id: "evt-1".into(),
            event_type: EventType::OrderAdmission,
            identity_id: "U1".into(),
            outcome: Outcome::Failure,
            detail: json!({ "reasons": ["KYC_INCOMPLETE"] }),
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"order_admission\""));
        assert!(json.contains("\"outcome\":\"failure\""));

        let parsed: ComplianceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_type_display_matches_serde() {
        for event_type in [
            EventType::AgeCheck,
            EventType::LocationCheck,
            EventType::KycCheck,
            EventType::VolumeCheck,
            EventType::OrderAdmission,
        ] {
            let serde_name = serde_json::to_string(&event_type).unwrap();
            assert_eq!(serde_name, format!("\"{}\"", event_type));
        }
    }

    #[test]
    fn test_outcome_from_passed() {
        assert_eq!(Outcome::from_passed(true), Outcome::Success);
        assert_eq!(Outcome::from_passed(false), Outcome::Failure);
    }
}
