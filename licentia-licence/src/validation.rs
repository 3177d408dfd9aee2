//! Licence validation.
//!
//! Checks run in a fixed order and stop at the first that decides the
//! outcome:
//! 1. no signature → [`ValidationResult::NoSignature`]
//! 2. now after `not_after` → [`ValidationResult::Expired`]
//! 3. now before `not_before` → [`ValidationResult::NotStarted`]
//! 4. signature check → [`ValidationResult::InvalidSignature`] or
//!    [`ValidationResult::Valid`]
//!
//! The window is checked before the signature, so an expired licence with
//! a good signature reports `Expired`. Validation never mutates the record.

use crate::record::LicenceRecord;
use crate::signer;
use crate::time::{now_or_local, NetworkTime, SystemClock, TimeSource};
use chrono::{DateTime, Utc};
use licentia_crypto::LicenceKey;
use licentia_types::LicenceTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Outcome of validating a licence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    /// The record carries no signature.
    NoSignature,
    /// The validity window has ended.
    Expired,
    /// The validity window has not started yet.
    NotStarted,
    /// The signature does not match the content or the key.
    InvalidSignature,
    /// Signed, in its window, and the signature checks out.
    Valid,
}

impl ValidationResult {
    /// Returns true only for [`ValidationResult::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Short snake_case name, matching the serde form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSignature => "no_signature",
            Self::Expired => "expired",
            Self::NotStarted => "not_started",
            Self::InvalidSignature => "invalid_signature",
            Self::Valid => "valid",
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates `record` against `key` at the current time.
///
/// With `use_network_time`, the time comes from the default SNTP server,
/// falling back to the local clock if the query fails.
#[must_use]
pub fn validate(
    record: &LicenceRecord,
    key: &LicenceKey,
    use_network_time: bool,
) -> ValidationResult {
    if use_network_time {
        validate_with(record, key, &NetworkTime::default())
    } else {
        validate_with(record, key, &SystemClock)
    }
}

/// Validates `record` against `key` using `clock` for the current time.
///
/// A failing clock is replaced by the local clock. Unsigned records are
/// rejected before the clock is consulted.
#[must_use]
pub fn validate_with(
    record: &LicenceRecord,
    key: &LicenceKey,
    clock: &dyn TimeSource,
) -> ValidationResult {
    if !record.is_signed() {
        return report(record, ValidationResult::NoSignature);
    }
    validate_at(record, key, now_or_local(clock))
}

/// Validates `record` against `key` as of `now`.
#[must_use]
pub fn validate_at(
    record: &LicenceRecord,
    key: &LicenceKey,
    now: DateTime<Utc>,
) -> ValidationResult {
    let outcome = evaluate(record, key, LicenceTimestamp::from_datetime(now));
    report(record, outcome)
}

fn evaluate(record: &LicenceRecord, key: &LicenceKey, now: LicenceTimestamp) -> ValidationResult {
    if !record.is_signed() {
        return ValidationResult::NoSignature;
    }
    if record.not_after().is_some_and(|end| now.is_after(&end)) {
        return ValidationResult::Expired;
    }
    if record.not_before().is_some_and(|start| now.is_before(&start)) {
        return ValidationResult::NotStarted;
    }
    if signer::verify(record, key) {
        ValidationResult::Valid
    } else {
        ValidationResult::InvalidSignature
    }
}

fn report(record: &LicenceRecord, outcome: ValidationResult) -> ValidationResult {
    debug!("licence {} validated: {}", record.serial(), outcome);
    outcome
}
