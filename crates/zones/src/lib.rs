//! Pourguard Zones - Where delivery is allowed
//!
//! ```text
//!             point
//!               │
//!    ┌──────────┴───────────┐
//!    ▼                      ▼
//! Exclusion zones       Delivery zones
//! (radius, full scan)   (polygon, first match)
//!    │                      │
//!    └──────────┬───────────┘
//!               ▼
//!        LocationVerdict ──► DeliveryHours (restriction codes)
//! ```
//!
//! The [`ZoneRegistry`] is loaded once (see [`ZoneSource`]) and is read-only
//! while requests are evaluated.

pub mod error;
pub mod hours;
pub mod location;
pub mod registry;
pub mod zone;

pub use error::{ZoneError, ZoneResult};
pub use hours::{parse_cutoff, DeliveryHours, DeliveryWindow, NextWindow};
pub use location::{evaluate_location, LocationVerdict, NearestExclusion};
pub use registry::{FileZoneSource, StaticZoneSource, ZoneRegistry, ZoneSource};
pub use zone::{DeliveryZone, ExclusionCategory, ExclusionZone};
