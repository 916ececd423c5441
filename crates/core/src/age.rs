//! Age evaluator
//!
//! `age = as_of.year - dob.year`, minus one when the birthday has not yet
//! occurred in `as_of`'s year (compared as `(month, day)` tuples).
//!
//! ## Leap-day birthdays
//!
//! Someone born on Feb 29 turns a year older on **Mar 1** in non-leap
//! years: `(2, 28) < (2, 29)` so Feb 28 still counts as "before the
//! birthday". In leap years the anniversary is Feb 29 itself.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Result of an age evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeVerdict {
    /// Completed years at `as_of`
    pub age: u32,
    /// `age >= minimum_age`
    pub eligible: bool,
}

/// Compute the age on `as_of` and gate it against `minimum_age`.
///
/// Fails with [`CoreError::InvalidDate`] when the birth date lies after `as_of`.
///
/// ```
/// use chrono::NaiveDate;
/// use pourguard_core::evaluate_age;
///
/// let dob = NaiveDate::from_ymd_opt(2004, 6, 15).unwrap();
/// let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
/// let verdict = evaluate_age(dob, today, 21).unwrap();
/// assert_eq!(verdict.age, 21);
/// assert!(verdict.eligible);
/// ```
pub fn evaluate_age(
    date_of_birth: NaiveDate,
    as_of: NaiveDate,
    minimum_age: u32,
) -> CoreResult<AgeVerdict> {
    if date_of_birth > as_of {
        return Err(CoreError::invalid_date(format!(
            "date of birth {date_of_birth} is after {as_of}"
        )));
    }

    let mut age = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    // dob <= as_of guarantees age >= 0
    let age = age as u32;

    Ok(AgeVerdict {
        age,
        eligible: age >= minimum_age,
    })
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date_of_birth(input: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CoreError::invalid_date(format!("'{input}': {e}")))
}
