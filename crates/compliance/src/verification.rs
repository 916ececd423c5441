//! Verification flows
//!
//! [`VerificationService`] runs the user-facing steps (age, location, KYC)
//! that set the flags on a [`VerificationRecord`], and the order flows that
//! read them back. Every step appends its events to the injected
//! [`AuditSink`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pourguard_core::{AgeVerdict, Coordinate, Milliliters};
use pourguard_zones::LocationVerdict;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::audit::{AuditEmitter, AuditSink};
use crate::engine::{Admission, ComplianceEngine, Evaluation};
use crate::error::{ComplianceError, ComplianceResult};
use crate::event::{ComplianceEvent, EventType, Outcome};
use crate::providers::{KycProvider, KycStatus, ReverseGeocoder};
use crate::record::VerificationRecord;

/// Storage for verification records
#[async_trait]
pub trait VerificationStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, identity_id: &str) -> ComplianceResult<Option<VerificationRecord>>;

    /// Insert or replace a record
    async fn put(&self, record: VerificationRecord) -> ComplianceResult<()>;
}

/// In-process record store
#[derive(Debug, Default)]
pub struct InMemoryVerificationStore {
    records: RwLock<HashMap<String, VerificationRecord>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = VerificationRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.identity_id.clone(), r))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, identity_id: &str) -> ComplianceResult<Option<VerificationRecord>> {
        Ok(self.records.read().await.get(identity_id).cloned())
    }

    async fn put(&self, record: VerificationRecord) -> ComplianceResult<()> {
        self.records
            .write()
            .await
            .insert(record.identity_id.clone(), record);
        Ok(())
    }
}

/// Mask an identity document number for audit logs: first four and last
/// four characters kept, `XXXX` in between. Numbers of eight characters or
/// fewer are masked entirely.
pub fn mask_document_number(document_number: &str) -> String {
    let chars: Vec<char> = document_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if chars.len() <= 8 {
        return "X".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}XXXX{tail}")
}

/// Outcome of the age verification step
#[derive(Debug, Clone, Serialize)]
pub struct AgeVerification {
    pub verdict: AgeVerdict,
    pub message: String,
    pub event: ComplianceEvent,
}

/// Outcome of the location verification step
#[derive(Debug, Clone, Serialize)]
pub struct LocationVerification {
    pub verdict: LocationVerdict,
    pub address: Option<String>,
    pub message: String,
    pub event: ComplianceEvent,
}

/// Outcome of the KYC step
#[derive(Debug, Clone, Serialize)]
pub struct KycVerification {
    pub status: KycStatus,
    pub complete: bool,
    pub message: String,
    pub event: ComplianceEvent,
}

/// Verification and order flows over a shared engine
pub struct VerificationService {
    engine: Arc<ComplianceEngine>,
    records: Arc<dyn VerificationStore>,
    kyc: Arc<dyn KycProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    audit: Arc<dyn AuditSink>,
    emitter: AuditEmitter,
}

impl VerificationService {
    pub fn new(
        engine: Arc<ComplianceEngine>,
        records: Arc<dyn VerificationStore>,
        kyc: Arc<dyn KycProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine,
            records,
            kyc,
            geocoder,
            audit,
            emitter: AuditEmitter::new(),
        }
    }

    pub fn engine(&self) -> &Arc<ComplianceEngine> {
        &self.engine
    }

    /// Current record of an identity
    pub async fn record(&self, identity_id: &str) -> ComplianceResult<VerificationRecord> {
        self.records
            .get(identity_id)
            .await?
            .ok_or_else(|| ComplianceError::IdentityNotFound(identity_id.to_string()))
    }

    /// Check the date of birth on an identity document.
    ///
    /// Creates the record when the identity is new. `age_verified` follows
    /// the outcome, so a failed attempt clears an earlier success.
    pub async fn verify_age(
        &self,
        identity_id: &str,
        date_of_birth: NaiveDate,
        document_number: &str,
        now: DateTime<Utc>,
    ) -> ComplianceResult<AgeVerification> {
        let as_of = self.engine.config().operating_day(now)?;
        let verdict = self.engine.evaluate_age(date_of_birth, as_of)?;
        let minimum_age = self.engine.config().minimum_age;

        let mut record = self
            .records
            .get(identity_id)
            .await?
            .unwrap_or_else(|| VerificationRecord::new(identity_id, date_of_birth));
        record.date_of_birth = date_of_birth;
        record.age_verified = verdict.eligible;
        record.touch(now);
        self.records.put(record).await?;

        let event = self.emitter.emit_at(
            EventType::AgeCheck,
            identity_id,
            Outcome::from_passed(verdict.eligible),
            json!({
                "document_number": mask_document_number(document_number),
                "age": verdict.age,
                "minimum_age": minimum_age,
                "verification_method": "document",
            }),
            now,
        );
        self.audit.append(&event).await?;

        let message = if verdict.eligible {
            "Age verification successful".to_string()
        } else {
            format!("You must be {minimum_age} or older to access alcohol delivery services")
        };
        tracing::info!(identity_id, eligible = verdict.eligible, "Age verification");

        Ok(AgeVerification {
            verdict,
            message,
            event,
        })
    }

    /// Check the identity's delivery location.
    pub async fn verify_location(
        &self,
        identity_id: &str,
        point: &Coordinate,
        now: DateTime<Utc>,
    ) -> ComplianceResult<LocationVerification> {
        let mut record = self.record(identity_id).await?;
        let verdict = self.engine.evaluate_location(point)?;

        let address = match self.geocoder.address_of(point).await {
            Ok(address) => address,
            Err(e) => {
                // Address is audit detail only; the verdict does not depend on it
                tracing::warn!(
                    geocoder = self.geocoder.name(),
                    error = %e,
                    "Reverse geocoding failed"
                );
                None
            }
        };

        record.location_verified = verdict.eligible;
        record.touch(now);
        self.records.put(record).await?;

        let event = self.emitter.emit_at(
            EventType::LocationCheck,
            identity_id,
            Outcome::from_passed(verdict.eligible),
            json!({
                "latitude": point.latitude(),
                "longitude": point.longitude(),
                "address": address,
                "is_restricted_zone": verdict.is_restricted(),
                "nearest_restriction": verdict
                    .restricted_zone_violations
                    .first()
                    .map(|z| z.name.as_str()),
                "delivery_zone": verdict.delivery_zone.as_ref().map(|z| z.name.as_str()),
            }),
            now,
        );
        self.audit.append(&event).await?;

        tracing::info!(identity_id, eligible = verdict.eligible, "Location verification");

        Ok(LocationVerification {
            message: verdict.summary(),
            verdict,
            address,
            event,
        })
    }

    /// Ask the KYC provider whether the identity has completed KYC.
    pub async fn complete_kyc(
        &self,
        identity_id: &str,
        now: DateTime<Utc>,
    ) -> ComplianceResult<KycVerification> {
        let mut record = self.record(identity_id).await?;
        let status = self.kyc.kyc_status(identity_id).await.map_err(|e| {
            tracing::error!(
                provider = self.kyc.name(),
                identity_id,
                error = %e,
                "KYC provider failed"
            );
            match e {
                ComplianceError::KycProvider(_) => e,
                other => ComplianceError::KycProvider(other.to_string()),
            }
        })?;
        let complete = status.is_complete();

        record.kyc_completed = complete;
        record.touch(now);
        self.records.put(record).await?;

        let event = self.emitter.emit_at(
            EventType::KycCheck,
            identity_id,
            Outcome::from_passed(complete),
            serde_json::to_value(&status)?,
            now,
        );
        self.audit.append(&event).await?;

        let message = if complete {
            "KYC verification completed successfully"
        } else {
            "KYC verification incomplete. Please complete all required steps."
        };

        Ok(KycVerification {
            status,
            complete,
            message: message.to_string(),
            event,
        })
    }

    /// Evaluate an order for a stored identity (read-only)
    pub async fn evaluate_order(
        &self,
        identity_id: &str,
        point: &Coordinate,
        volume: Milliliters,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Evaluation> {
        let record = self.record(identity_id).await?;
        let evaluation = self
            .engine
            .evaluate_order_eligibility(&record, point, volume, now)
            .await?;
        self.audit.append_all(&evaluation.events).await?;
        Ok(evaluation)
    }

    /// Admit an order for a stored identity, committing its volume when allowed.
    ///
    /// If the volume was committed but the audit write fails, the error is
    /// [`ComplianceError::AdmittedWithoutAudit`] and still holds the
    /// admission.
    pub async fn admit_order(
        &self,
        identity_id: &str,
        point: &Coordinate,
        volume: Milliliters,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Admission> {
        let record = self.record(identity_id).await?;
        let admission = self.engine.admit_order(&record, point, volume, now).await?;

        match self.audit.append_all(&admission.evaluation.events).await {
            Ok(()) => Ok(admission),
            Err(e) if admission.committed.is_some() => {
                tracing::error!(
                    identity_id,
                    sink = self.audit.name(),
                    error = %e,
                    "Order committed but audit write failed"
                );
                Err(ComplianceError::AdmittedWithoutAudit {
                    identity_id: identity_id.to_string(),
                    admission: Box::new(admission),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
