//! Compliance report over a period of audit events

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::event::{ComplianceEvent, EventType};

const MIN_SUCCESS_RATE: Decimal = dec!(90);
const MAX_AGE_FAILURES: usize = 5;
const MAX_LOCATION_FAILURES: usize = 3;

/// Summary of compliance activity in `[period_start, period_end]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_events: usize,
    /// Percentage of successful events, 2 dp (0 for an empty period)
    pub success_rate: Decimal,
    pub events_by_type: BTreeMap<EventType, usize>,
    pub failed_events: Vec<ComplianceEvent>,
    pub recommendations: Vec<String>,
}

impl ComplianceReport {
    /// Build a report from events; both period bounds are inclusive
    pub fn generate<'a, I>(events: I, start: DateTime<Utc>, end: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a ComplianceEvent>,
    {
        let in_period: Vec<&ComplianceEvent> = events
            .into_iter()
            .filter(|e| e.occurred_between(start, end))
            .collect();

        let total_events = in_period.len();
        let successes = in_period.iter().filter(|e| e.is_success()).count();

        let success_rate = if total_events == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(successes) * Decimal::ONE_HUNDRED / Decimal::from(total_events))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };

        let mut events_by_type = BTreeMap::new();
        for event in &in_period {
            *events_by_type.entry(event.event_type).or_insert(0) += 1;
        }

        let failed_events: Vec<ComplianceEvent> = in_period
            .into_iter()
            .filter(|e| !e.is_success())
            .cloned()
            .collect();

        let recommendations = recommendations(&failed_events, success_rate);

        Self {
            period_start: start,
            period_end: end,
            total_events,
            success_rate,
            events_by_type,
            failed_events,
            recommendations,
        }
    }

    /// Failed events of one type
    pub fn failures_of(&self, event_type: EventType) -> usize {
        self.failed_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

fn recommendations(failed: &[ComplianceEvent], success_rate: Decimal) -> Vec<String> {
    let failures = |t: EventType| failed.iter().filter(|e| e.event_type == t).count();
    let mut out = Vec::new();

    if success_rate < MIN_SUCCESS_RATE {
        out.push(
            "Consider improving user onboarding process to reduce verification failures"
                .to_string(),
        );
    }
    if failures(EventType::AgeCheck) > MAX_AGE_FAILURES {
        out.push("Enhance age verification UI/UX to reduce user errors".to_string());
    }
    if failures(EventType::LocationCheck) > MAX_LOCATION_FAILURES {
        out.push(
            "Review geofencing accuracy and provide clearer location guidance".to_string(),
        );
    }

    out
}
