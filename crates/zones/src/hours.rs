//! Delivery-hour windows derived from zone restriction codes
//!
//! Recognised codes:
//! - `cutoff_HH:MM`
//! - `no_delivery_after_HH:MM`
//!
//! When several cutoffs apply the earliest wins. A cutoff at or before the
//! opening time closes the zone for deliveries altogether. Unknown codes are
//! ignored here (they may be meaningful to other collaborators, e.g.
//! `kyc_required`).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

const CUTOFF_PREFIXES: [&str; 2] = ["cutoff_", "no_delivery_after_"];

/// Parse the cutoff time out of a restriction code
///
/// ```
/// use chrono::NaiveTime;
/// use pourguard_zones::parse_cutoff;
///
/// assert_eq!(parse_cutoff("cutoff_21:00"), NaiveTime::from_hms_opt(21, 0, 0));
/// assert_eq!(parse_cutoff("kyc_required"), None);
/// ```
pub fn parse_cutoff(code: &str) -> Option<NaiveTime> {
    CUTOFF_PREFIXES
        .iter()
        .find_map(|prefix| code.strip_prefix(prefix))
        .and_then(|time| NaiveTime::parse_from_str(time, "%H:%M").ok())
}

/// When the next delivery window opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "day", content = "opens_at", rename_all = "snake_case")]
pub enum NextWindow {
    Today(NaiveTime),
    Tomorrow(NaiveTime),
}

/// Result of checking a local time against delivery hours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub can_deliver_now: bool,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    /// Set when delivery is not possible right now; stays `None` for a zone
    /// whose window is empty
    pub next_window: Option<NextWindow>,
}

/// Daily delivery hours `[opens_at, closes_at)` in operating local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl DeliveryHours {
    /// Create delivery hours
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime) -> Self {
        Self { opens_at, closes_at }
    }

    /// Apply zone restriction codes on top of default hours
    pub fn from_restrictions<'a, I>(codes: I, defaults: DeliveryHours) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cutoff = codes.into_iter().filter_map(parse_cutoff).min();
        match cutoff {
            Some(cutoff) if cutoff < defaults.closes_at => Self {
                closes_at: cutoff.max(defaults.opens_at),
                ..defaults
            },
            _ => defaults,
        }
    }

    /// No delivery at any time of day
    pub fn is_closed(&self) -> bool {
        self.closes_at <= self.opens_at
    }

    /// Check whether delivery is possible at `local_time`
    pub fn check(&self, local_time: NaiveTime) -> DeliveryWindow {
        let can_deliver_now = local_time >= self.opens_at && local_time < self.closes_at;

        let next_window = if can_deliver_now || self.is_closed() {
            None
        } else if local_time < self.opens_at {
            Some(NextWindow::Today(self.opens_at))
        } else {
            Some(NextWindow::Tomorrow(self.opens_at))
        };

        DeliveryWindow {
            can_deliver_now,
            opens_at: self.opens_at,
            closes_at: self.closes_at,
            next_window,
        }
    }
}
