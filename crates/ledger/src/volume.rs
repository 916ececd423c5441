//! Volume Ledger - limit check with two-phase reservations

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use pourguard_core::Milliliters;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::entry::{LedgerKey, VolumeLedgerEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::store::VolumeStore;

/// Outcome of a daily-limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeCheck {
    pub key: LedgerKey,
    /// Volume already admitted that day (0 if no row)
    pub existing: Milliliters,
    pub incoming: Milliliters,
    pub total_after: Milliliters,
    pub limit: Milliliters,
    /// `total_after <= limit`
    pub allowed: bool,
}

impl VolumeCheck {
    fn compute(
        key: LedgerKey,
        existing: Milliliters,
        incoming: Milliliters,
        limit: Milliliters,
    ) -> LedgerResult<Self> {
        let total_after = existing
            .checked_add(incoming)
            .ok_or_else(|| LedgerError::Overflow(key.to_string()))?;
        Ok(Self {
            key,
            existing,
            incoming,
            total_after,
            limit,
            allowed: total_after <= limit,
        })
    }

    /// Volume still available before this order
    pub fn remaining(&self) -> Milliliters {
        self.limit.saturating_sub(self.existing)
    }
}

/// A checked order holding the exclusive lock on its `(identity, day)` row.
///
/// Commit with [`VolumeLedger::commit_reservation`]. Dropping it releases
/// the lock without touching the ledger.
#[derive(Debug)]
pub struct Reservation {
    check: VolumeCheck,
    _guard: OwnedMutexGuard<()>,
}

impl Reservation {
    /// The limit check this reservation was taken with
    pub fn check(&self) -> &VolumeCheck {
        &self.check
    }

    /// Whether the order fits under the limit
    pub fn allowed(&self) -> bool {
        self.check.allowed
    }

    /// Total after this order
    pub fn total_after(&self) -> Milliliters {
        self.check.total_after
    }

    /// Ledger key being held
    pub fn key(&self) -> &LedgerKey {
        &self.check.key
    }
}

/// A reservation holder makes two store calls (load, then compare-and-swap)
/// before releasing the row, so a waiter is allowed that plus one more call.
const LOCK_WAIT_FACTOR: u32 = 3;

/// Daily volume ledger over an injected [`VolumeStore`]
pub struct VolumeLedger {
    store: Arc<dyn VolumeStore>,
    locks: Mutex<HashMap<LedgerKey, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
    lock_timeout: Duration,
}

impl VolumeLedger {
    /// Create a ledger; every store call is bounded by `timeout` and the
    /// wait for a reserved row by `LOCK_WAIT_FACTOR * timeout`
    pub fn new(store: Arc<dyn VolumeStore>, timeout: Duration) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            timeout,
            lock_timeout: timeout * LOCK_WAIT_FACTOR,
        }
    }

    /// Override how long a reservation waits for the row lock
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Bound on a single store call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bound on the wait for another reservation of the same row
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn VolumeStore> {
        &self.store
    }

    /// Volume admitted so far for `key`
    pub async fn current_total(&self, key: &LedgerKey) -> LedgerResult<Milliliters> {
        let row = self.bounded("load", self.store.load(key)).await?;
        Ok(row.map(|r| r.cumulative_ml).unwrap_or(Milliliters::ZERO))
    }

    /// Read-only limit check. Takes no lock and never writes.
    pub async fn check(
        &self,
        identity_id: &str,
        day: NaiveDate,
        incoming: Milliliters,
        limit: Milliliters,
    ) -> LedgerResult<VolumeCheck> {
        let key = LedgerKey::new(identity_id, day);
        let existing = self.current_total(&key).await?;
        VolumeCheck::compute(key, existing, incoming, limit)
    }

    /// Phase one: lock the row, read it and compute the limit check.
    ///
    /// Other reservations for the same identity and day wait until this one
    /// is committed or dropped. Giving up on that wait is
    /// [`LedgerError::Contended`], not a storage fault.
    pub async fn check_and_reserve(
        &self,
        identity_id: &str,
        day: NaiveDate,
        incoming: Milliliters,
        limit: Milliliters,
    ) -> LedgerResult<Reservation> {
        let key = LedgerKey::new(identity_id, day);
        let lock = self.key_lock(&key)?;

        let guard = match tokio::time::timeout(self.lock_timeout, lock.lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                let waited_ms = self.lock_timeout.as_millis() as u64;
                tracing::warn!(key = %key, waited_ms, "Ledger row still reserved");
                return Err(LedgerError::Contended {
                    key: key.to_string(),
                    waited_ms,
                });
            }
        };

        let existing = self.current_total(&key).await?;
        let check = VolumeCheck::compute(key, existing, incoming, limit)?;

        tracing::debug!(
            key = %check.key,
            existing = check.existing.value(),
            incoming = check.incoming.value(),
            allowed = check.allowed,
            "Volume reserved"
        );

        Ok(Reservation {
            check,
            _guard: guard,
        })
    }

    /// Phase two: write `total_after` for an allowed reservation.
    pub async fn commit_reservation(
        &self,
        reservation: Reservation,
    ) -> LedgerResult<VolumeLedgerEntry> {
        let check = &reservation.check;
        if !check.allowed {
            return Err(LedgerError::ReservationRejected {
                key: check.key.to_string(),
                total_after: check.total_after.value(),
                limit: check.limit.value(),
            });
        }

        let swapped = self
            .bounded(
                "commit",
                self.store
                    .compare_and_swap(&check.key, check.existing, check.total_after),
            )
            .await?;

        if !swapped {
            tracing::error!(
                key = %check.key,
                store = self.store.name(),
                "Ledger row changed under reservation"
            );
            return Err(LedgerError::ConcurrentModification(check.key.to_string()));
        }

        tracing::debug!(key = %check.key, total = check.total_after.value(), "Volume committed");
        Ok(VolumeLedgerEntry::new(&check.key, check.total_after))
        // reservation (and its lock) dropped here
    }

    fn key_lock(&self, key: &LedgerKey) -> LedgerResult<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LedgerError::LockPoisoned(key.to_string()))?;
        // Forget locks nobody is holding or waiting on
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = LedgerResult<T>>,
    ) -> LedgerResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    store = self.store.name(),
                    timeout_ms = self.timeout_ms(),
                    "Ledger store timed out"
                );
                Err(LedgerError::Timeout {
                    operation,
                    timeout_ms: self.timeout_ms(),
                })
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}
