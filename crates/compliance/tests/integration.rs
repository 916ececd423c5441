//! Integration tests for engine + zones + ledger + audit flow

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

use pourguard_compliance::{
    AuditLedger, AuditSink, ComplianceConfig, ComplianceEngine, ComplianceError, ComplianceReport,
    EventType, InMemoryVerificationStore, ReasonCode, StaticGeocoder, StaticKycProvider,
    VerificationRecord, VerificationService,
};
use pourguard_core::{Coordinate, Milliliters, EARTH_RADIUS_METERS};
use pourguard_ledger::{
    InMemoryVolumeStore, LedgerKey, LedgerResult, VolumeLedgerEntry, VolumeStore,
};
use pourguard_zones::{
    DeliveryZone, ExclusionCategory, ExclusionZone, FileZoneSource, ZoneRegistry,
};

const SCHOOL: (f64, f64) = (27.3314, 88.6138);
const SCHOOL_RADIUS: f64 = 500.0;

fn c(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 14:00 IST on 2025-03-14
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap()
}

/// Gangtok-like fixture: one school inside a large service square
fn registry() -> ZoneRegistry {
    ZoneRegistry::new(
        vec![ExclusionZone::new(
            "school_01",
            "Tashi Namgyal Academy",
            ExclusionCategory::School,
            c(SCHOOL.0, SCHOOL.1),
            SCHOOL_RADIUS,
        )],
        vec![DeliveryZone::new(
            "gangtok_central",
            "Gangtok Central",
            vec![c(27.30, 88.58), c(27.30, 88.65), c(27.36, 88.65), c(27.36, 88.58)],
        )
        .with_restriction("cutoff_21:00")],
    )
    .unwrap()
}

fn engine_with_store(store: Arc<dyn VolumeStore>) -> Arc<ComplianceEngine> {
    Arc::new(ComplianceEngine::new(ComplianceConfig::default(), registry(), store).unwrap())
}

fn served_point() -> Coordinate {
    c(27.3400, 88.6300)
}

/// Point `meters` due north of the school centre
fn north_of_school(meters: f64) -> Coordinate {
    let dlat = (meters / EARTH_RADIUS_METERS).to_degrees();
    c(SCHOOL.0 + dlat, SCHOOL.1)
}

#[tokio::test]
async fn test_user_turning_21_today_is_allowed() {
    let engine = engine_with_store(Arc::new(InMemoryVolumeStore::new()));
    let birthday = VerificationRecord::fully_verified("U21", date(2004, 3, 14));

    let eval = engine
        .evaluate_order_eligibility(&birthday, &served_point(), Milliliters::new(750), now())
        .await
        .unwrap();
    assert!(eval.allowed());
    assert_eq!(eval.age.age, 21);

    let day_before = VerificationRecord::fully_verified("U20", date(2004, 3, 15));
    let eval = engine
        .evaluate_order_eligibility(&day_before, &served_point(), Milliliters::new(750), now())
        .await
        .unwrap();
    assert_eq!(eval.verdict.reasons, vec![ReasonCode::AgeUnderMinimum]);
}

#[tokio::test]
async fn test_exclusion_centre_and_just_outside() {
    let engine = engine_with_store(Arc::new(InMemoryVolumeStore::new()));

    let centre = engine.evaluate_location(&c(SCHOOL.0, SCHOOL.1)).unwrap();
    assert!(!centre.eligible);
    assert_eq!(centre.restricted_zone_violations[0].id, "school_01");

    let outside = engine
        .evaluate_location(&north_of_school(SCHOOL_RADIUS + 1.0))
        .unwrap();
    assert!(outside.restricted_zone_violations.is_empty());
    assert!(outside.eligible);
    let nearest = outside.nearest_exclusion.unwrap();
    assert_eq!(nearest.zone_id, "school_01");
    assert!(nearest.distance_meters > SCHOOL_RADIUS);
}

#[tokio::test]
async fn test_restricted_zone_is_the_only_reason() {
    let engine = engine_with_store(Arc::new(InMemoryVolumeStore::new()));
    let record = VerificationRecord::fully_verified("U1", date(1990, 1, 1));

    let eval = engine
        .evaluate_order_eligibility(&record, &c(SCHOOL.0, SCHOOL.1), Milliliters::new(750), now())
        .await
        .unwrap();

    assert!(!eval.allowed());
    assert_eq!(eval.verdict.reasons, vec![ReasonCode::RestrictedZone]);
    assert_eq!(eval.verdict.reason_codes(), vec!["RESTRICTED_ZONE".to_string()]);
}

#[tokio::test]
async fn test_reevaluation_is_idempotent() {
    let engine = engine_with_store(Arc::new(InMemoryVolumeStore::new()));
    let record = VerificationRecord::new("U1", date(1990, 1, 1));

    let first = engine
        .evaluate_order_eligibility(&record, &c(SCHOOL.0, SCHOOL.1), Milliliters::new(2500), now())
        .await
        .unwrap();
    let second = engine
        .evaluate_order_eligibility(&record, &c(SCHOOL.0, SCHOOL.1), Milliliters::new(2500), now())
        .await
        .unwrap();

    assert_eq!(first.verdict, second.verdict);
    assert_eq!(first.volume, second.volume);
}

#[tokio::test]
async fn test_ledger_limit_boundaries() {
    let store = Arc::new(InMemoryVolumeStore::new());
    store
        .seed(LedgerKey::new("U1", date(2025, 3, 14)), Milliliters::new(1800))
        .await;
    let engine = engine_with_store(store.clone());
    let record = VerificationRecord::fully_verified("U1", date(1990, 1, 1));

    let over = engine
        .admit_order(&record, &served_point(), Milliliters::new(300), now())
        .await
        .unwrap();
    assert_eq!(over.evaluation.verdict.reasons, vec![ReasonCode::DailyLimitExceeded]);
    assert_eq!(over.evaluation.volume.total_after, Milliliters::new(2100));
    assert!(over.committed.is_none());

    let fits = engine
        .admit_order(&record, &served_point(), Milliliters::new(150), now())
        .await
        .unwrap();
    assert!(fits.evaluation.allowed());
    assert_eq!(fits.committed.unwrap().cumulative_ml, Milliliters::new(1950));
}

#[tokio::test]
async fn test_concurrent_orders_admit_exactly_one() {
    let store = Arc::new(InMemoryVolumeStore::new());
    store
        .seed(LedgerKey::new("U1", date(2025, 3, 14)), Milliliters::new(1800))
        .await;
    let engine = engine_with_store(store.clone());

    let handles: Vec<_> = [150u64, 300]
        .into_iter()
        .map(|ml| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let record = VerificationRecord::fully_verified("U1", date(1990, 1, 1));
                engine
                    .admit_order(&record, &served_point(), Milliliters::new(ml), now())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().committed.is_some() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 1);
    let rows = store.entries_for("U1").await;
    assert_eq!(rows[0].cumulative_ml, Milliliters::new(1950));
}

struct UnreachableStore;

#[async_trait]
impl VolumeStore for UnreachableStore {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn load(&self, _key: &LedgerKey) -> LedgerResult<Option<VolumeLedgerEntry>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(None)
    }

    async fn compare_and_swap(
        &self,
        _key: &LedgerKey,
        _expected: Milliliters,
        _new: Milliliters,
    ) -> LedgerResult<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn test_ledger_timeout_fails_closed() {
    let config = ComplianceConfig {
        ledger_timeout_ms: 20,
        ..Default::default()
    };
    let engine = ComplianceEngine::new(config, registry(), Arc::new(UnreachableStore)).unwrap();
    let record = VerificationRecord::fully_verified("U1", date(1990, 1, 1));

    let evaluated = engine
        .evaluate_order_eligibility(&record, &served_point(), Milliliters::new(100), now())
        .await;
    assert!(matches!(evaluated, Err(ComplianceError::LedgerUnavailable(_))));

    let admitted = engine
        .admit_order(&record, &served_point(), Milliliters::new(100), now())
        .await;
    assert!(matches!(admitted, Err(ComplianceError::LedgerUnavailable(_))));
}

/// Every call takes 300 ms: slow, but inside the 500 ms ledger timeout
struct SlowStore {
    inner: InMemoryVolumeStore,
}

#[async_trait]
impl VolumeStore for SlowStore {
    fn name(&self) -> &str {
        "slow"
    }

    async fn load(&self, key: &LedgerKey) -> LedgerResult<Option<VolumeLedgerEntry>> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.inner.load(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: Milliliters,
        new: Milliliters,
    ) -> LedgerResult<bool> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.inner.compare_and_swap(key, expected, new).await
    }
}

#[tokio::test]
async fn test_same_day_orders_queue_on_slow_store() {
    let store = Arc::new(SlowStore {
        inner: InMemoryVolumeStore::new(),
    });
    let config = ComplianceConfig {
        ledger_timeout_ms: 500,
        ..Default::default()
    };
    let engine = Arc::new(ComplianceEngine::new(config, registry(), store.clone()).unwrap());

    let handles: Vec<_> = [750u64, 500]
        .into_iter()
        .map(|ml| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let record = VerificationRecord::fully_verified("U1", date(1990, 1, 1));
                engine
                    .admit_order(&record, &served_point(), Milliliters::new(ml), now())
                    .await
            })
        })
        .collect();

    for handle in handles {
        let admission = handle.await.unwrap().unwrap();
        assert!(admission.committed.is_some());
    }
    let rows = store.inner.entries_for("U1").await;
    assert_eq!(rows[0].cumulative_ml, Milliliters::new(1250));
}

#[tokio::test]
async fn test_file_backed_end_to_end() {
    let dir = tempdir().unwrap();
    let zones_path = dir.path().join("zones.json");
    std::fs::write(&zones_path, serde_json::to_string(&registry()).unwrap()).unwrap();

    let engine = Arc::new(
        ComplianceEngine::load(
            ComplianceConfig::default(),
            &FileZoneSource::new(&zones_path),
            Arc::new(InMemoryVolumeStore::new()),
        )
        .await
        .unwrap(),
    );

    let audit = Arc::new(AuditLedger::open(dir.path().join("audit").join("events.jsonl")).unwrap());
    let service = VerificationService::new(
        engine,
        Arc::new(InMemoryVerificationStore::new()),
        Arc::new(StaticKycProvider::approving()),
        Arc::new(StaticGeocoder::none()),
        audit.clone(),
    );

    service
        .verify_age("U1", date(1995, 8, 20), "9876 5432 1098", now())
        .await
        .unwrap();
    service.verify_location("U1", &served_point(), now()).await.unwrap();
    service.complete_kyc("U1", now()).await.unwrap();

    let admission = service
        .admit_order("U1", &served_point(), Milliliters::new(750), now())
        .await
        .unwrap();
    assert!(admission.evaluation.allowed());

    let denied = service
        .admit_order("U1", &served_point(), Milliliters::new(1500), now())
        .await
        .unwrap();
    assert_eq!(
        denied.evaluation.verdict.reasons,
        vec![ReasonCode::DailyLimitExceeded]
    );

    let events = audit.read_all().await.unwrap();
    assert_eq!(events.len(), 3 + 5 + 5);
    assert_eq!(audit.line_count().await.unwrap(), 13);

    let report = ComplianceReport::generate(
        &events,
        now() - chrono::Duration::hours(1),
        now() + chrono::Duration::hours(1),
    );
    assert_eq!(report.total_events, 13);
    assert_eq!(report.events_by_type[&EventType::OrderAdmission], 2);
    // Denied order: volume_check + order_admission failed
    assert_eq!(report.failed_events.len(), 2);
}
