//! Application context - wires everything together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pourguard_compliance::{AuditLedger, ComplianceConfig, ComplianceEngine};
use pourguard_ledger::InMemoryVolumeStore;
use pourguard_zones::FileZoneSource;

/// Application context - one engine, one volume store, one audit ledger
pub struct AppContext {
    pub engine: Arc<ComplianceEngine>,
    pub volumes: Arc<InMemoryVolumeStore>,
    pub audit: Arc<AuditLedger>,
    zones_path: PathBuf,
}

impl AppContext {
    /// Load config (defaults when `config_path` is `None`), the zone
    /// registry and the audit ledger
    pub async fn new(
        zones_path: impl AsRef<Path>,
        config_path: Option<&Path>,
        audit_path: impl AsRef<Path>,
    ) -> Result<Self, anyhow::Error> {
        let zones_path = zones_path.as_ref().to_path_buf();

        let config = match config_path {
            Some(path) => ComplianceConfig::from_file(path)?,
            None => ComplianceConfig::default(),
        };

        let volumes = Arc::new(InMemoryVolumeStore::new());
        let engine = ComplianceEngine::load(
            config,
            &FileZoneSource::new(&zones_path),
            volumes.clone(),
        )
        .await?;

        let audit = Arc::new(AuditLedger::open(audit_path)?);

        tracing::debug!(
            zones = %zones_path.display(),
            audit = %audit.path().display(),
            "Context ready"
        );

        Ok(Self {
            engine: Arc::new(engine),
            volumes,
            audit,
            zones_path,
        })
    }

    /// Get zone file path
    pub fn zones_path(&self) -> &Path {
        &self.zones_path
    }

    /// Get audit ledger path
    pub fn audit_path(&self) -> &Path {
        self.audit.path()
    }
}
