//! Tick-precision UTC timestamps.
//!
//! A tick is 100 nanoseconds; the epoch is 0001-01-01T00:00:00Z. Both
//! validity bounds of a licence are carried as a signed 64-bit tick count,
//! so anything converted from a [`DateTime<Utc>`] is truncated to tick
//! precision before it can be signed.

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count of 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const NANOS_PER_TICK: i64 = 100;

/// A point in time with 100 ns resolution, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenceTimestamp(i64);

impl LicenceTimestamp {
    /// Creates a timestamp at the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Creates a timestamp from a raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Converts a UTC date-time, truncating below tick precision.
    ///
    /// Instants outside the tick range saturate at its bounds.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = i128::from(dt.timestamp());
        let sub_ticks = i128::from(dt.timestamp_subsec_nanos()) / i128::from(NANOS_PER_TICK);
        let ticks = i128::from(UNIX_EPOCH_TICKS) + secs * i128::from(TICKS_PER_SECOND) + sub_ticks;
        Self(ticks.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }

    /// Converts back into a UTC date-time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] if the tick count lies outside the
    /// range chrono can represent.
    pub fn to_datetime(&self) -> crate::Result<DateTime<Utc>> {
        let since_unix = i128::from(self.0) - i128::from(UNIX_EPOCH_TICKS);
        let secs = since_unix.div_euclid(i128::from(TICKS_PER_SECOND));
        let nanos =
            since_unix.rem_euclid(i128::from(TICKS_PER_SECOND)) * i128::from(NANOS_PER_TICK);
        i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, nanos as u32))
            .ok_or_else(|| Error::InvalidTimestamp(format!("{} ticks out of range", self.0)))
    }

    /// Returns true if this timestamp is strictly before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns true if this timestamp is strictly after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl From<DateTime<Utc>> for LicenceTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Display for LicenceTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Ok(dt) => write!(f, "{}", dt.to_rfc3339()),
            Err(_) => write!(f, "{} ticks", self.0),
        }
    }
}
