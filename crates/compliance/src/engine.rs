//! Compliance Engine - order eligibility orchestrator
//!
//! The single decision authority for "may this order be admitted". Every
//! constituent check always runs so the verdict carries the complete set of
//! failing reasons, never just the first one.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use pourguard_core::{AgeVerdict, Coordinate, Milliliters};
use pourguard_ledger::{Reservation, VolumeCheck, VolumeLedger, VolumeLedgerEntry, VolumeStore};
use pourguard_zones::{
    DeliveryHours, DeliveryWindow, DeliveryZone, LocationVerdict, ZoneRegistry, ZoneSource,
};
use serde::Serialize;
use serde_json::json;

use crate::audit::AuditEmitter;
use crate::config::ComplianceConfig;
use crate::error::{ComplianceError, ComplianceResult};
use crate::event::{ComplianceEvent, EventType, Outcome};
use crate::record::VerificationRecord;
use crate::verdict::{ComplianceVerdict, ReasonCode};

/// Full result of an order evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub verdict: ComplianceVerdict,
    pub age: AgeVerdict,
    pub location: LocationVerdict,
    pub volume: VolumeCheck,
    /// Only computed when delivery hours are enforced and a zone matched
    pub delivery_window: Option<DeliveryWindow>,
    /// One event per constituent check plus the `order_admission` event, last
    pub events: Vec<ComplianceEvent>,
}

impl Evaluation {
    pub fn allowed(&self) -> bool {
        self.verdict.allowed
    }
}

/// Result of [`ComplianceEngine::admit_order`]
#[derive(Debug, Clone, Serialize)]
pub struct Admission {
    pub evaluation: Evaluation,
    /// Ledger row after commit, `None` when the order was denied
    pub committed: Option<VolumeLedgerEntry>,
}

/// Checks that do not touch the volume ledger
struct Prechecks {
    day: NaiveDate,
    age: AgeVerdict,
    location: LocationVerdict,
}

/// Main Compliance Engine
///
/// Built once and shared by handle (`Arc<ComplianceEngine>`).
pub struct ComplianceEngine {
    config: ComplianceConfig,
    zones: Arc<ZoneRegistry>,
    ledger: VolumeLedger,
    emitter: AuditEmitter,
    default_hours: DeliveryHours,
}

impl ComplianceEngine {
    /// Create an engine over an already-loaded registry
    pub fn new(
        config: ComplianceConfig,
        zones: impl Into<Arc<ZoneRegistry>>,
        store: Arc<dyn VolumeStore>,
    ) -> ComplianceResult<Self> {
        config.validate()?;
        let default_hours = config.default_delivery_hours()?;
        let ledger = VolumeLedger::new(store, config.ledger_timeout());

        Ok(Self {
            config,
            zones: zones.into(),
            ledger,
            emitter: AuditEmitter::new(),
            default_hours,
        })
    }

    /// Load the registry from `source` (bounded by `registry_timeout`) and
    /// create an engine
    pub async fn load(
        config: ComplianceConfig,
        source: &dyn ZoneSource,
        store: Arc<dyn VolumeStore>,
    ) -> ComplianceResult<Self> {
        let registry = tokio::time::timeout(config.registry_timeout(), source.load())
            .await
            .map_err(|_| {
                tracing::error!(
                    source = source.name(),
                    timeout_ms = config.registry_timeout_ms,
                    "Zone registry load timed out"
                );
                ComplianceError::ZoneRegistryUnavailable(format!(
                    "{} did not answer within {}ms",
                    source.name(),
                    config.registry_timeout_ms
                ))
            })??;

        Self::new(config, registry, store)
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Zone registry in use
    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    /// Volume ledger in use
    pub fn ledger(&self) -> &VolumeLedger {
        &self.ledger
    }

    /// Location verdict for a point
    pub fn evaluate_location(&self, point: &Coordinate) -> ComplianceResult<LocationVerdict> {
        Ok(pourguard_zones::evaluate_location(point, &self.zones)?)
    }

    /// Age verdict against the configured minimum age
    pub fn evaluate_age(
        &self,
        date_of_birth: NaiveDate,
        as_of: NaiveDate,
    ) -> ComplianceResult<AgeVerdict> {
        Ok(pourguard_core::evaluate_age(
            date_of_birth,
            as_of,
            self.config.minimum_age,
        )?)
    }

    /// Delivery window of `zone` at `now` in operating local time
    pub fn check_delivery_window(
        &self,
        zone: &DeliveryZone,
        now: DateTime<Utc>,
    ) -> ComplianceResult<DeliveryWindow> {
        let hours = DeliveryHours::from_restrictions(
            zone.restrictions.iter().map(String::as_str),
            self.default_hours,
        );
        Ok(hours.check(self.config.local_time(now)?))
    }

    /// Lock and check the daily limit for `(identity, day)` using the
    /// configured limit
    pub async fn check_and_reserve(
        &self,
        identity_id: &str,
        day: NaiveDate,
        incoming: Milliliters,
    ) -> ComplianceResult<Reservation> {
        Ok(self
            .ledger
            .check_and_reserve(identity_id, day, incoming, self.config.daily_limit())
            .await?)
    }

    /// Commit an allowed reservation
    pub async fn commit_reservation(
        &self,
        reservation: Reservation,
    ) -> ComplianceResult<VolumeLedgerEntry> {
        Ok(self.ledger.commit_reservation(reservation).await?)
    }

    /// Evaluate an order without changing any state.
    ///
    /// Input errors are raised before any check runs. Ledger faults are
    /// errors, never an allowed verdict.
    pub async fn evaluate_order_eligibility(
        &self,
        identity: &VerificationRecord,
        point: &Coordinate,
        volume: Milliliters,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Evaluation> {
        let pre = self.prechecks(identity, point, now)?;

        let check = self
            .ledger
            .check(
                &identity.identity_id,
                pre.day,
                volume,
                self.config.daily_limit(),
            )
            .await
            .map_err(|e| self.ledger_fault(&identity.identity_id, e))?;

        self.decide(identity, point, pre, check, now, false)
    }

    /// Evaluate an order and, when allowed, add its volume to the ledger.
    ///
    /// The `(identity, day)` row stays locked from the limit check until the
    /// commit, so two concurrent orders cannot both pass against the same
    /// remaining allowance.
    pub async fn admit_order(
        &self,
        identity: &VerificationRecord,
        point: &Coordinate,
        volume: Milliliters,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Admission> {
        let pre = self.prechecks(identity, point, now)?;

        let reservation = self
            .ledger
            .check_and_reserve(
                &identity.identity_id,
                pre.day,
                volume,
                self.config.daily_limit(),
            )
            .await
            .map_err(|e| self.ledger_fault(&identity.identity_id, e))?;

        let check = reservation.check().clone();
        let allowed = self.verdict_for(&pre, identity, &check, now)?.0.allowed;

        let committed = if allowed {
            let entry = self
                .ledger
                .commit_reservation(reservation)
                .await
                .map_err(|e| self.ledger_fault(&identity.identity_id, e))?;
            Some(entry)
        } else {
            // Release the row without writing
            drop(reservation);
            None
        };

        let evaluation = self.decide(identity, point, pre, check, now, committed.is_some())?;
        Ok(Admission {
            evaluation,
            committed,
        })
    }

    fn prechecks(
        &self,
        identity: &VerificationRecord,
        point: &Coordinate,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Prechecks> {
        let day = self.config.operating_day(now)?;
        let age = self.evaluate_age(identity.date_of_birth, day)?;
        let location = self.evaluate_location(point)?;
        Ok(Prechecks { day, age, location })
    }

    fn verdict_for(
        &self,
        pre: &Prechecks,
        identity: &VerificationRecord,
        volume: &VolumeCheck,
        now: DateTime<Utc>,
    ) -> ComplianceResult<(ComplianceVerdict, Option<DeliveryWindow>)> {
        let mut reasons = Vec::new();

        if !pre.age.eligible {
            reasons.push(ReasonCode::AgeUnderMinimum);
        }
        if !identity.kyc_completed {
            reasons.push(ReasonCode::KycIncomplete);
        }
        if !identity.location_verified {
            reasons.push(ReasonCode::LocationNotVerified);
        }
        if pre.location.is_restricted() {
            reasons.push(ReasonCode::RestrictedZone);
        }
        if !pre.location.in_service_area() {
            reasons.push(ReasonCode::OutsideServiceArea);
        }
        if !volume.allowed {
            reasons.push(ReasonCode::DailyLimitExceeded);
        }

        let delivery_window = match &pre.location.delivery_zone {
            Some(zone) if self.config.enforce_delivery_hours => {
                Some(self.check_delivery_window(zone, now)?)
            }
            _ => None,
        };
        if delivery_window.as_ref().is_some_and(|w| !w.can_deliver_now) {
            reasons.push(ReasonCode::OutsideDeliveryHours);
        }

        Ok((ComplianceVerdict::from_reasons(reasons, now), delivery_window))
    }

    fn decide(
        &self,
        identity: &VerificationRecord,
        point: &Coordinate,
        pre: Prechecks,
        volume: VolumeCheck,
        now: DateTime<Utc>,
        committed: bool,
    ) -> ComplianceResult<Evaluation> {
        let (verdict, delivery_window) = self.verdict_for(&pre, identity, &volume, now)?;
        let events = self.events_for(
            identity,
            point,
            &pre,
            &volume,
            &verdict,
            delivery_window.as_ref(),
            committed,
            now,
        );

        if verdict.allowed {
            tracing::debug!(
                identity_id = %identity.identity_id,
                volume_ml = volume.incoming.value(),
                committed,
                "Order allowed"
            );
        } else {
            tracing::warn!(
                identity_id = %identity.identity_id,
                reasons = ?verdict.reasons,
                "Order denied"
            );
        }

        Ok(Evaluation {
            verdict,
            age: pre.age,
            location: pre.location,
            volume,
            delivery_window,
            events,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn events_for(
        &self,
        identity: &VerificationRecord,
        point: &Coordinate,
        pre: &Prechecks,
        volume: &VolumeCheck,
        verdict: &ComplianceVerdict,
        delivery_window: Option<&DeliveryWindow>,
        committed: bool,
        now: DateTime<Utc>,
    ) -> Vec<ComplianceEvent> {
        let id = identity.identity_id.as_str();
        let location = &pre.location;
        let location_ok = identity.location_verified && location.eligible;

        let emit = |event_type, passed, detail| {
            self.emitter
                .emit_at(event_type, id, Outcome::from_passed(passed), detail, now)
        };

        vec![
            emit(
                EventType::AgeCheck,
                pre.age.eligible,
                json!({
                    "age": pre.age.age,
                    "minimum_age": self.config.minimum_age,
                    "age_verified": identity.age_verified,
                }),
            ),
            emit(
                EventType::KycCheck,
                identity.kyc_completed,
                json!({ "kyc_completed": identity.kyc_completed }),
            ),
            emit(
                EventType::LocationCheck,
                location_ok,
                json!({
                    "latitude": point.latitude(),
                    "longitude": point.longitude(),
                    "location_verified": identity.location_verified,
                    "restricted_zone_violations": location
                        .restricted_zone_violations
                        .iter()
                        .map(|z| z.id.as_str())
                        .collect::<Vec<_>>(),
                    "delivery_zone": location.delivery_zone.as_ref().map(|z| z.id.as_str()),
                }),
            ),
            emit(
                EventType::VolumeCheck,
                volume.allowed,
                json!({
                    "day": volume.key.day,
                    "existing_ml": volume.existing.value(),
                    "incoming_ml": volume.incoming.value(),
                    "total_after_ml": volume.total_after.value(),
                    "limit_ml": volume.limit.value(),
                }),
            ),
            emit(
                EventType::OrderAdmission,
                verdict.allowed,
                json!({
                    "allowed": verdict.allowed,
                    "reasons": verdict.reason_codes(),
                    "committed": committed,
                    "delivery_window": delivery_window,
                }),
            ),
        ]
    }

    fn ledger_fault(
        &self,
        identity_id: &str,
        err: pourguard_ledger::LedgerError,
    ) -> ComplianceError {
        if err.is_unavailable() {
            tracing::error!(
                identity_id,
                error = %err,
                "Volume ledger unavailable, failing closed"
            );
        }
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pourguard_ledger::{InMemoryVolumeStore, LedgerKey};
    use pourguard_zones::{ExclusionCategory, ExclusionZone};

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 12:00 IST on 2025-06-15
    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 6, 30, 0).unwrap()
    }

    fn registry() -> ZoneRegistry {
        ZoneRegistry::new(
            vec![ExclusionZone::new(
                "school_01",
                "Academy",
                ExclusionCategory::School,
                c(0.2, 0.2),
                500.0,
            )],
            vec![DeliveryZone::new(
                "square",
                "Square",
                vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0), c(1.0, 0.0)],
            )
            .with_restriction("cutoff_21:00")],
        )
        .unwrap()
    }

    fn engine_with(config: ComplianceConfig) -> (Arc<InMemoryVolumeStore>, ComplianceEngine) {
        let store = Arc::new(InMemoryVolumeStore::new());
        let engine = ComplianceEngine::new(config, registry(), store.clone()).unwrap();
        (store, engine)
    }

    fn adult() -> VerificationRecord {
        VerificationRecord::fully_verified("U1", date(1990, 1, 1))
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let (_, engine) = engine_with(ComplianceConfig::default());
        let eval = engine
            .evaluate_order_eligibility(&adult(), &c(0.5, 0.5), Milliliters::new(750), noon())
            .await
            .unwrap();

        assert!(eval.allowed());
        assert!(eval.verdict.reasons.is_empty());
        assert_eq!(eval.verdict.checked_at, noon());
        assert_eq!(eval.events.len(), 5);
        assert!(eval.events.iter().all(|e| e.is_success()));
        assert_eq!(eval.events[4].event_type, EventType::OrderAdmission);
    }

    #[tokio::test]
    async fn test_every_failure_is_reported() {
        let (store, engine) = engine_with(ComplianceConfig::default());
        store
            .seed(LedgerKey::new("minor", date(2025, 6, 15)), Milliliters::new(1900))
            .await;

        let minor = VerificationRecord::new("minor", date(2010, 1, 1));
        let eval = engine
            .evaluate_order_eligibility(&minor, &c(5.0, 5.0), Milliliters::new(500), noon())
            .await
            .unwrap();

        assert_eq!(
            eval.verdict.reasons,
            vec![
                ReasonCode::AgeUnderMinimum,
                ReasonCode::KycIncomplete,
                ReasonCode::LocationNotVerified,
                ReasonCode::OutsideServiceArea,
                ReasonCode::DailyLimitExceeded,
            ]
        );
        assert!(eval.events.iter().all(|e| !e.is_success()));
    }

    #[tokio::test]
    async fn test_evaluation_never_writes_ledger() {
        let (store, engine) = engine_with(ComplianceConfig::default());
        engine
            .evaluate_order_eligibility(&adult(), &c(0.5, 0.5), Milliliters::new(750), noon())
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_birth_after_today_is_input_error() {
        let (_, engine) = engine_with(ComplianceConfig::default());
        let unborn = VerificationRecord::fully_verified("U1", date(2030, 1, 1));
        let result = engine
            .evaluate_order_eligibility(&unborn, &c(0.5, 0.5), Milliliters::new(100), noon())
            .await;
        assert!(matches!(result, Err(ComplianceError::Input(_))));
    }

    #[tokio::test]
    async fn test_admit_commits_when_allowed() {
        let (store, engine) = engine_with(ComplianceConfig::default());
        let admission = engine
            .admit_order(&adult(), &c(0.5, 0.5), Milliliters::new(750), noon())
            .await
            .unwrap();

        assert!(admission.evaluation.allowed());
        assert_eq!(
            admission.committed.unwrap().cumulative_ml,
            Milliliters::new(750)
        );
        assert_eq!(store.entries_for("U1").await.len(), 1);
        assert_eq!(admission.evaluation.events[4].detail["committed"], true);
    }

    #[tokio::test]
    async fn test_admit_denied_leaves_ledger_untouched() {
        let (store, engine) = engine_with(ComplianceConfig::default());
        let mut record = adult();
        record.kyc_completed = false;

        let admission = engine
            .admit_order(&record, &c(0.5, 0.5), Milliliters::new(750), noon())
            .await
            .unwrap();

        assert!(!admission.evaluation.allowed());
        assert!(admission.committed.is_none());
        assert!(store.is_empty().await);
        assert_eq!(admission.evaluation.events[4].detail["committed"], false);
    }

    #[tokio::test]
    async fn test_ledger_day_is_operating_day() {
        let (store, engine) = engine_with(ComplianceConfig::default());
        // 20:00 UTC on the 14th is already the 15th in IST
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 20, 0, 0).unwrap();
        engine
            .admit_order(&adult(), &c(0.5, 0.5), Milliliters::new(100), now)
            .await
            .unwrap();

        assert_eq!(store.entries_for("U1").await[0].day, date(2025, 6, 15));
    }

    #[tokio::test]
    async fn test_delivery_hours_ignored_by_default() {
        let (_, engine) = engine_with(ComplianceConfig::default());
        // 21:30 IST, after the zone cutoff
        let late = Utc.with_ymd_and_hms(2025, 6, 15, 16, 0, 0).unwrap();
        let eval = engine
            .evaluate_order_eligibility(&adult(), &c(0.5, 0.5), Milliliters::new(100), late)
            .await
            .unwrap();
        assert!(eval.allowed());
        assert!(eval.delivery_window.is_none());
    }

    #[tokio::test]
    async fn test_delivery_hours_enforced() {
        let config = ComplianceConfig {
            enforce_delivery_hours: true,
            ..Default::default()
        };
        let (_, engine) = engine_with(config);
        let late = Utc.with_ymd_and_hms(2025, 6, 15, 16, 0, 0).unwrap();

        let eval = engine
            .evaluate_order_eligibility(&adult(), &c(0.5, 0.5), Milliliters::new(100), late)
            .await
            .unwrap();

        assert_eq!(eval.verdict.reasons, vec![ReasonCode::OutsideDeliveryHours]);
        let window = eval.delivery_window.unwrap();
        assert!(!window.can_deliver_now);
    }

    #[test]
    fn test_check_delivery_window_uses_zone_cutoff() {
        let (_, engine) = engine_with(ComplianceConfig::default());
        let zone = engine.zones().delivery_zone("square").unwrap().clone();

        let window = engine.check_delivery_window(&zone, noon()).unwrap();
        assert!(window.can_deliver_now);
        assert_eq!(window.closes_at, chrono::NaiveTime::from_hms_opt(21, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_registry_load_timeout() {
        use async_trait::async_trait;
        use pourguard_zones::ZoneResult;

        struct Hanging;

        #[async_trait]
        impl ZoneSource for Hanging {
            fn name(&self) -> &str {
                "hanging"
            }

            async fn load(&self) -> ZoneResult<ZoneRegistry> {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok(ZoneRegistry::default())
            }
        }

        let config = ComplianceConfig {
            registry_timeout_ms: 10,
            ..Default::default()
        };
        let result =
            ComplianceEngine::load(config, &Hanging, Arc::new(InMemoryVolumeStore::new())).await;
        assert!(matches!(
            result,
            Err(ComplianceError::ZoneRegistryUnavailable(_))
        ));
    }
}
