//! Verification record - what has been proven about an identity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Verification state of one identity
///
/// Flags are set by successful verification steps and never expire on
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub identity_id: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub age_verified: bool,
    #[serde(default)]
    pub kyc_completed: bool,
    #[serde(default)]
    pub location_verified: bool,
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// Fresh record with nothing verified yet
    pub fn new(identity_id: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self {
            identity_id: identity_id.into(),
            date_of_birth,
            age_verified: false,
            kyc_completed: false,
            location_verified: false,
            last_verified_at: None,
        }
    }

    /// Record with every flag set (test fixtures, migrations)
    pub fn fully_verified(identity_id: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self {
            age_verified: true,
            kyc_completed: true,
            location_verified: true,
            ..Self::new(identity_id, date_of_birth)
        }
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.last_verified_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flags_default_to_false() {
        let json = r#"{ "identity_id": "U1", "date_of_birth": "1990-05-01" }"#;
        let record: VerificationRecord = serde_json::from_str(json).unwrap();

        assert!(!record.age_verified);
        assert!(!record.kyc_completed);
        assert!(!record.location_verified);
        assert!(record.last_verified_at.is_none());
    }

    #[test]
    fn test_fully_verified() {
        let dob = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
        let record = VerificationRecord::fully_verified("U1", dob);
        assert!(record.age_verified && record.kyc_completed && record.location_verified);
    }
}
