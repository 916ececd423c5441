//! Geospatial primitives
//!
//! - [`distance_meters`]: great-circle distance (haversine)
//! - [`contains_point`]: even-odd ray casting over a polygon boundary
//!
//! ## Boundary rule
//!
//! A point lying exactly on a polygon edge or vertex is treated as
//! **outside**. The check runs before the ray cast, so the result does not
//! depend on edge orientation or vertex order.

use crate::coordinate::Coordinate;
use crate::error::{CoreError, CoreResult};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Tolerance for the on-edge test, in squared-degree units
const EDGE_EPSILON: f64 = 1e-12;

/// Great-circle distance between two coordinates in meters.
///
/// Symmetric, and exactly `0.0` when `a == b`.
///
/// ```
/// use pourguard_core::{distance_meters, Coordinate};
///
/// let a = Coordinate::new(27.3314, 88.6138).unwrap();
/// let b = Coordinate::new(27.3389, 88.6065).unwrap();
/// assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
/// assert_eq!(distance_meters(&a, &a), 0.0);
/// ```
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let d_phi = (b.latitude() - a.latitude()).to_radians();
    let d_lambda = (b.longitude() - a.longitude()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h marginally outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Even-odd containment test.
///
/// Latitude is the "x" axis and longitude the "y" sweep axis, matching the
/// order coordinates are stored in. Points on the boundary are outside (see
/// module docs).
///
/// Returns [`CoreError::InvalidGeometry`] for polygons with fewer than 3 points.
pub fn contains_point(polygon: &[Coordinate], point: &Coordinate) -> CoreResult<bool> {
    if polygon.len() < 3 {
        return Err(CoreError::InvalidGeometry {
            points: polygon.len(),
        });
    }

    let x = point.latitude();
    let y = point.longitude();

    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        if on_segment(&polygon[j], &polygon[i], point) {
            return Ok(false);
        }
        j = i;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].latitude(), polygon[i].longitude());
        let (xj, yj) = (polygon[j].latitude(), polygon[j].longitude());

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    Ok(inside)
}

fn on_segment(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> bool {
    let (ax, ay) = (a.latitude(), a.longitude());
    let (bx, by) = (b.latitude(), b.longitude());
    let (px, py) = (p.latitude(), p.longitude());

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }

    px >= ax.min(bx) - EDGE_EPSILON
        && px <= ax.max(bx) + EDGE_EPSILON
        && py >= ay.min(by) - EDGE_EPSILON
        && py <= ay.max(by) + EDGE_EPSILON
}
