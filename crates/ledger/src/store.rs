//! Volume store - storage collaborator for ledger rows
//!
//! The engine never owns persistence. A store only has to offer a read and
//! an atomic compare-and-swap on the cumulative volume of one row.

use std::collections::HashMap;

use async_trait::async_trait;
use pourguard_core::Milliliters;
use tokio::sync::RwLock;

use crate::entry::{LedgerKey, VolumeLedgerEntry};
use crate::error::LedgerResult;

/// Storage for `(identity, day)` volume rows
#[async_trait]
pub trait VolumeStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &str;

    /// Read a row, `None` when no purchase has been admitted that day
    async fn load(&self, key: &LedgerKey) -> LedgerResult<Option<VolumeLedgerEntry>>;

    /// Set the row to `new` only if it currently holds `expected`
    /// (an absent row holds zero).
    ///
    /// Returns `Ok(false)` when the row no longer matches `expected`.
    async fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: Milliliters,
        new: Milliliters,
    ) -> LedgerResult<bool>;
}

/// In-process store (tests, single-node deployments)
#[derive(Debug, Default)]
pub struct InMemoryVolumeStore {
    entries: RwLock<HashMap<LedgerKey, Milliliters>>,
}

impl InMemoryVolumeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with rows
    pub fn with_entries(entries: impl IntoIterator<Item = VolumeLedgerEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|e| (e.key(), e.cumulative_ml))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Overwrite a row unconditionally (administrative seeding)
    pub async fn seed(&self, key: LedgerKey, total: Milliliters) {
        self.entries.write().await.insert(key, total);
    }

    /// All rows for one identity, ordered by day
    pub async fn entries_for(&self, identity_id: &str) -> Vec<VolumeLedgerEntry> {
        let entries = self.entries.read().await;
        let mut rows: Vec<_> = entries
            .iter()
            .filter(|(k, _)| k.identity_id == identity_id)
            .map(|(k, v)| VolumeLedgerEntry::new(k, *v))
            .collect();
        rows.sort_by_key(|e| e.day);
        rows
    }

    /// Number of rows
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no rows exist
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VolumeStore for InMemoryVolumeStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, key: &LedgerKey) -> LedgerResult<Option<VolumeLedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|v| VolumeLedgerEntry::new(key, *v)))
    }

    async fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: Milliliters,
        new: Milliliters,
    ) -> LedgerResult<bool> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).copied().unwrap_or(Milliliters::ZERO);
        if current != expected {
            return Ok(false);
        }
        entries.insert(key.clone(), new);
        Ok(true)
    }
}
