//! Zone Registry - reference data for location checks
//!
//! Loaded once from configuration and read-only afterwards. Administrative
//! updates build a new registry rather than mutating this one.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ZoneError, ZoneResult};
use crate::zone::{DeliveryZone, ExclusionZone};

/// Validated set of exclusion and delivery zones
///
/// Delivery zone order is significant: the first active zone containing a
/// point is the one assigned to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneRegistry {
    #[serde(default)]
    exclusion_zones: Vec<ExclusionZone>,
    #[serde(default)]
    delivery_zones: Vec<DeliveryZone>,
}

impl ZoneRegistry {
    /// Build a registry, validating every zone
    pub fn new(
        exclusion_zones: Vec<ExclusionZone>,
        delivery_zones: Vec<DeliveryZone>,
    ) -> ZoneResult<Self> {
        let registry = Self {
            exclusion_zones,
            delivery_zones,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Parse and validate a registry from JSON
    pub fn from_json(json: &str) -> ZoneResult<Self> {
        let registry: ZoneRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ZoneResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// All exclusion zones, in registry order
    pub fn list_exclusion_zones(&self) -> &[ExclusionZone] {
        &self.exclusion_zones
    }

    /// Active delivery zones, in registry order
    pub fn list_active_delivery_zones(&self) -> Vec<&DeliveryZone> {
        self.delivery_zones.iter().filter(|z| z.active).collect()
    }

    /// All delivery zones including inactive ones
    pub fn delivery_zones(&self) -> &[DeliveryZone] {
        &self.delivery_zones
    }

    /// Look up a delivery zone by id
    pub fn delivery_zone(&self, id: &str) -> Option<&DeliveryZone> {
        self.delivery_zones.iter().find(|z| z.id == id)
    }

    /// True when the registry holds no zones at all
    pub fn is_empty(&self) -> bool {
        self.exclusion_zones.is_empty() && self.delivery_zones.is_empty()
    }

    fn validate(&self) -> ZoneResult<()> {
        let mut seen = HashSet::new();

        for zone in &self.exclusion_zones {
            if !seen.insert(zone.id.as_str()) {
                return Err(ZoneError::DuplicateZoneId(zone.id.clone()));
            }
            if !zone.radius_meters.is_finite() || zone.radius_meters < 0.0 {
                return Err(ZoneError::InvalidRadius {
                    id: zone.id.clone(),
                    radius: zone.radius_meters,
                });
            }
        }

        for zone in &self.delivery_zones {
            if !seen.insert(zone.id.as_str()) {
                return Err(ZoneError::DuplicateZoneId(zone.id.clone()));
            }
            if zone.boundary.len() < 3 {
                return Err(ZoneError::InvalidBoundary {
                    id: zone.id.clone(),
                    source: pourguard_core::CoreError::InvalidGeometry {
                        points: zone.boundary.len(),
                    },
                });
            }
        }

        Ok(())
    }
}

/// Loader for the zone registry (configuration file, database, admin API)
#[async_trait]
pub trait ZoneSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Load and validate the registry
    async fn load(&self) -> ZoneResult<ZoneRegistry>;
}

/// Zone source backed by a JSON file
pub struct FileZoneSource {
    path: PathBuf,
}

impl FileZoneSource {
    /// Create a source reading from `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path to the zone file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ZoneSource for FileZoneSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> ZoneResult<ZoneRegistry> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ZoneError::Unavailable {
                source_name: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let registry = ZoneRegistry::from_json(&content)?;

        tracing::info!(
            path = %self.path.display(),
            exclusion_zones = registry.list_exclusion_zones().len(),
            delivery_zones = registry.delivery_zones().len(),
            "Loaded zone registry"
        );
        Ok(registry)
    }
}

/// Zone source returning a fixed registry (tests, embedded defaults)
pub struct StaticZoneSource {
    registry: ZoneRegistry,
}

impl StaticZoneSource {
    /// Wrap an already-built registry
    pub fn new(registry: ZoneRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ZoneSource for StaticZoneSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self) -> ZoneResult<ZoneRegistry> {
        Ok(self.registry.clone())
    }
}
