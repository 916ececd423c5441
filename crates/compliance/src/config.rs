//! Compliance configuration
//!
//! Thresholds live in config, not in code, so a market can be retuned
//! without recompilation.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use pourguard_core::Milliliters;
use pourguard_zones::DeliveryHours;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};

/// Configuration for the Compliance Engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    // === Eligibility ===
    /// Legal drinking age in whole years
    #[serde(default = "default_minimum_age")]
    pub minimum_age: u32,

    /// Per-identity cap on regulated volume per operating day
    #[serde(default = "default_daily_limit_ml")]
    pub daily_limit_ml: u64,

    // === Operating day ===
    /// UTC offset of the operating timezone, in minutes
    #[serde(default = "default_operating_utc_offset_minutes")]
    pub operating_utc_offset_minutes: i32,

    // === Collaborators ===
    /// Bound on every volume ledger call
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,

    /// Bound on loading the zone registry
    #[serde(default = "default_registry_timeout_ms")]
    pub registry_timeout_ms: u64,

    // === Delivery hours ===
    /// Add OUTSIDE_DELIVERY_HOURS to order verdicts
    #[serde(default)]
    pub enforce_delivery_hours: bool,

    #[serde(default = "default_delivery_start_hour")]
    pub default_delivery_start_hour: u32,

    #[serde(default = "default_delivery_end_hour")]
    pub default_delivery_end_hour: u32,
}

// Default value functions for serde
fn default_minimum_age() -> u32 {
    21
}

fn default_daily_limit_ml() -> u64 {
    2000
}

fn default_operating_utc_offset_minutes() -> i32 {
    330 // IST
}

fn default_ledger_timeout_ms() -> u64 {
    500
}

fn default_registry_timeout_ms() -> u64 {
    2000
}

fn default_delivery_start_hour() -> u32 {
    10
}

fn default_delivery_end_hour() -> u32 {
    22
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            minimum_age: default_minimum_age(),
            daily_limit_ml: default_daily_limit_ml(),
            operating_utc_offset_minutes: default_operating_utc_offset_minutes(),
            ledger_timeout_ms: default_ledger_timeout_ms(),
            registry_timeout_ms: default_registry_timeout_ms(),
            enforce_delivery_hours: false,
            default_delivery_start_hour: default_delivery_start_hour(),
            default_delivery_end_hour: default_delivery_end_hour(),
        }
    }
}

impl ComplianceConfig {
    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> ComplianceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ComplianceConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot describe a real operating setup
    pub fn validate(&self) -> ComplianceResult<()> {
        self.operating_offset()?;
        self.default_delivery_hours()?;
        Ok(())
    }

    /// Daily limit as a volume
    pub fn daily_limit(&self) -> Milliliters {
        Milliliters::new(self.daily_limit_ml)
    }

    /// Ledger timeout as Duration
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    /// Registry load timeout as Duration
    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }

    /// Operating timezone
    pub fn operating_offset(&self) -> ComplianceResult<FixedOffset> {
        self.operating_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ComplianceError::ConfigError(format!(
                    "operating_utc_offset_minutes out of range: {}",
                    self.operating_utc_offset_minutes
                ))
            })
    }

    /// Calendar day of `now` in the operating timezone (the ledger day)
    pub fn operating_day(&self, now: DateTime<Utc>) -> ComplianceResult<NaiveDate> {
        Ok(now.with_timezone(&self.operating_offset()?).date_naive())
    }

    /// Wall-clock time of `now` in the operating timezone
    pub fn local_time(&self, now: DateTime<Utc>) -> ComplianceResult<NaiveTime> {
        let local = now.with_timezone(&self.operating_offset()?);
        // Leap seconds are folded into the preceding second
        NaiveTime::from_hms_opt(local.hour(), local.minute(), local.second()).ok_or_else(|| {
            ComplianceError::ConfigError(format!("unrepresentable local time for {now}"))
        })
    }

    /// Delivery hours before any zone cutoff is applied
    pub fn default_delivery_hours(&self) -> ComplianceResult<DeliveryHours> {
        let hour = |h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0).ok_or_else(|| {
                ComplianceError::ConfigError(format!("delivery hour out of range: {h}"))
            })
        };
        let opens_at = hour(self.default_delivery_start_hour)?;
        let closes_at = if self.default_delivery_end_hour == 24 {
            NaiveTime::from_hms_opt(23, 59, 59)
                .ok_or_else(|| ComplianceError::ConfigError("end of day".into()))?
        } else {
            hour(self.default_delivery_end_hour)?
        };
        if opens_at >= closes_at {
            return Err(ComplianceError::ConfigError(format!(
                "delivery hours {} to {} are empty",
                self.default_delivery_start_hour, self.default_delivery_end_hour
            )));
        }
        Ok(DeliveryHours::new(opens_at, closes_at))
    }
}
