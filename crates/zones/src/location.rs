//! Location evaluator
//!
//! Combines the exclusion-zone scan and delivery-zone lookup into one
//! verdict. A point outside every delivery zone is an ordinary
//! `eligible = false` outcome, not an error.

use std::collections::BTreeSet;

use pourguard_core::Coordinate;
use serde::{Deserialize, Serialize};

use crate::error::ZoneResult;
use crate::registry::ZoneRegistry;
use crate::zone::{DeliveryZone, ExclusionCategory, ExclusionZone};

/// Nearest exclusion zone to a point that violates none of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestExclusion {
    pub zone_id: String,
    pub zone_name: String,
    pub category: ExclusionCategory,
    pub distance_meters: f64,
}

/// Delivery eligibility of a single point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationVerdict {
    /// No violations and a delivery zone matched
    pub eligible: bool,
    /// Every exclusion zone the point falls inside
    pub restricted_zone_violations: Vec<ExclusionZone>,
    /// First active delivery zone containing the point
    pub delivery_zone: Option<DeliveryZone>,
    /// Restriction codes of the assigned delivery zone
    pub restrictions: BTreeSet<String>,
    /// Informational, only set when there are no violations
    pub nearest_exclusion: Option<NearestExclusion>,
}

impl LocationVerdict {
    /// Point lies inside at least one exclusion zone
    pub fn is_restricted(&self) -> bool {
        !self.restricted_zone_violations.is_empty()
    }

    /// Point lies inside an active delivery zone
    pub fn in_service_area(&self) -> bool {
        self.delivery_zone.is_some()
    }

    /// Human-readable summary for the verification step
    pub fn summary(&self) -> String {
        if self.is_restricted() {
            let categories: BTreeSet<String> = self
                .restricted_zone_violations
                .iter()
                .map(|z| z.category.to_string().replace('_', " "))
                .collect();
            format!(
                "Delivery not allowed near {}",
                categories.into_iter().collect::<Vec<_>>().join(", ")
            )
        } else if !self.in_service_area() {
            "Location is outside the delivery service area".to_string()
        } else {
            "Location verified for delivery".to_string()
        }
    }
}

/// Evaluate a point against the registry.
///
/// 1. Full scan of exclusion zones (no early exit, every violation is reported).
/// 2. First active delivery zone, in registry order, containing the point.
/// 3. `eligible = violations.is_empty() && zone matched`.
pub fn evaluate_location(point: &Coordinate, zones: &ZoneRegistry) -> ZoneResult<LocationVerdict> {
    let mut violations = Vec::new();
    let mut nearest: Option<(&ExclusionZone, f64)> = None;

    for zone in zones.list_exclusion_zones() {
        let distance = zone.distance_to(point);
        if distance <= zone.radius_meters {
            violations.push(zone.clone());
        }
        if nearest.map_or(true, |(_, d)| distance < d) {
            nearest = Some((zone, distance));
        }
    }

    let mut assigned = None;
    for zone in zones.list_active_delivery_zones() {
        if zone.contains(point)? {
            assigned = Some(zone.clone());
            break;
        }
    }

    let restrictions = assigned
        .as_ref()
        .map(|z| z.restrictions.clone())
        .unwrap_or_default();

    let nearest_exclusion = if violations.is_empty() {
        nearest.map(|(zone, distance)| NearestExclusion {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            category: zone.category,
            distance_meters: distance,
        })
    } else {
        None
    };

    let eligible = violations.is_empty() && assigned.is_some();

    tracing::debug!(
        point = %point,
        eligible,
        violations = violations.len(),
        delivery_zone = assigned.as_ref().map(|z| z.id.as_str()),
        "Location evaluated"
    );

    Ok(LocationVerdict {
        eligible,
        restricted_zone_violations: violations,
        delivery_zone: assigned,
        restrictions,
        nearest_exclusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn square(id: &str, lat0: f64, lon0: f64) -> DeliveryZone {
        DeliveryZone::new(
            id,
            id,
            vec![
                c(lat0, lon0),
                c(lat0, lon0 + 1.0),
                c(lat0 + 1.0, lon0 + 1.0),
                c(lat0 + 1.0, lon0),
            ],
        )
    }

    fn school(id: &str, center: Coordinate, radius: f64) -> ExclusionZone {
        ExclusionZone::new(id, id, ExclusionCategory::School, center, radius)
    }

    #[test]
    fn test_inside_delivery_zone_no_exclusions() {
        let zones = ZoneRegistry::new(
            vec![school("far", c(10.0, 10.0), 500.0)],
            vec![square("a", 0.0, 0.0).with_restriction("cutoff_21:00")],
        )
        .unwrap();

        let verdict = evaluate_location(&c(0.5, 0.5), &zones).unwrap();

        assert!(verdict.eligible);
        assert_eq!(verdict.delivery_zone.as_ref().unwrap().id, "a");
        assert!(verdict.restrictions.contains("cutoff_21:00"));
        assert_eq!(verdict.nearest_exclusion.as_ref().unwrap().zone_id, "far");
        assert_eq!(verdict.summary(), "Location verified for delivery");
    }

    #[test]
    fn test_outside_service_area_is_not_an_error() {
        let zones = ZoneRegistry::new(vec![], vec![square("a", 0.0, 0.0)]).unwrap();
        let verdict = evaluate_location(&c(5.0, 5.0), &zones).unwrap();

        assert!(!verdict.eligible);
        assert!(verdict.delivery_zone.is_none());
        assert!(verdict.restrictions.is_empty());
        assert!(!verdict.is_restricted());
    }

    #[test]
    fn test_all_violations_collected() {
        let point = c(0.5, 0.5);
        let zones = ZoneRegistry::new(
            vec![
                school("s1", point, 100.0),
                school("s2", c(10.0, 10.0), 100.0),
                ExclusionZone::new(
                    "g1",
                    "Secretariat",
                    ExclusionCategory::Government,
                    point,
                    300.0,
                ),
            ],
            vec![square("a", 0.0, 0.0)],
        )
        .unwrap();

        let verdict = evaluate_location(&point, &zones).unwrap();

        assert!(!verdict.eligible);
        let ids: Vec<_> = verdict
            .restricted_zone_violations
            .iter()
            .map(|z| z.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s1", "g1"]);
        // Still assigned to the zone even though excluded
        assert!(verdict.in_service_area());
        assert!(verdict.nearest_exclusion.is_none());
        assert_eq!(verdict.summary(), "Delivery not allowed near government, school");
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let zones = ZoneRegistry::new(
            vec![],
            vec![square("first", 0.0, 0.0), square("second", 0.0, 0.0)],
        )
        .unwrap();
        let verdict = evaluate_location(&c(0.5, 0.5), &zones).unwrap();
        assert_eq!(verdict.delivery_zone.unwrap().id, "first");
    }

    #[test]
    fn test_inactive_zone_skipped() {
        let zones = ZoneRegistry::new(
            vec![],
            vec![square("closed", 0.0, 0.0).deactivated(), square("open", 0.0, 0.0)],
        )
        .unwrap();
        let verdict = evaluate_location(&c(0.5, 0.5), &zones).unwrap();
        assert_eq!(verdict.delivery_zone.unwrap().id, "open");

        let only_closed =
            ZoneRegistry::new(vec![], vec![square("closed", 0.0, 0.0).deactivated()]).unwrap();
        assert!(!evaluate_location(&c(0.5, 0.5), &only_closed).unwrap().eligible);
    }

    #[test]
    fn test_empty_registry() {
        let verdict = evaluate_location(&c(0.5, 0.5), &ZoneRegistry::default()).unwrap();
        assert!(!verdict.eligible);
        assert!(verdict.nearest_exclusion.is_none());
        assert_eq!(
            verdict.summary(),
            "Location is outside the delivery service area"
        );
    }
}
