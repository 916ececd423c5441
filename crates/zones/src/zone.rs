//! Zone model
//!
//! - [`ExclusionZone`]: circle around a sensitive site, delivery always forbidden
//! - [`DeliveryZone`]: polygon where service is offered, with restriction codes

use std::collections::BTreeSet;

use pourguard_core::{contains_point, distance_meters, Coordinate, CoreResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Kind of sensitive site an exclusion zone protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExclusionCategory {
    School,
    #[serde(alias = "temple")]
    #[strum(to_string = "place_of_worship", serialize = "temple")]
    PlaceOfWorship,
    Government,
    Hospital,
    #[serde(alias = "dry_zone")]
    #[strum(to_string = "other", serialize = "dry_zone")]
    Other,
}

/// Radius-based exclusion zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub id: String,
    pub name: String,
    pub category: ExclusionCategory,
    pub center: Coordinate,
    pub radius_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExclusionZone {
    /// Create an exclusion zone
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ExclusionCategory,
        center: Coordinate,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            center,
            radius_meters,
            description: None,
        }
    }

    /// Distance from the zone centre to `point`
    pub fn distance_to(&self, point: &Coordinate) -> f64 {
        distance_meters(point, &self.center)
    }

    /// A point within `radius_meters` (inclusive) violates the zone
    pub fn is_violated_by(&self, point: &Coordinate) -> bool {
        self.distance_to(point) <= self.radius_meters
    }
}

/// Polygon-based delivery zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: String,
    pub name: String,
    pub boundary: Vec<Coordinate>,
    #[serde(default = "default_active", alias = "is_active")]
    pub active: bool,
    #[serde(default)]
    pub restrictions: BTreeSet<String>,
}

fn default_active() -> bool {
    true
}

impl DeliveryZone {
    /// Create an active delivery zone with no restrictions
    pub fn new(id: impl Into<String>, name: impl Into<String>, boundary: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            boundary,
            active: true,
            restrictions: BTreeSet::new(),
        }
    }

    /// Add a restriction code
    pub fn with_restriction(mut self, code: impl Into<String>) -> Self {
        self.restrictions.insert(code.into());
        self
    }

    /// Mark the zone inactive
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Even-odd containment of `point` in the boundary
    pub fn contains(&self, point: &Coordinate) -> CoreResult<bool> {
        contains_point(&self.boundary, point)
    }
}
