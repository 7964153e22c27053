//! Time claims on the wire
//!
//! A [`NumericDate`] is an instant measured in seconds since the Unix epoch,
//! as carried by `exp`, `nbf` and `iat`. In memory the value keeps
//! millisecond precision; the JSON projection carries at most two decimal
//! places, so only dates on a 10ms boundary survive a JSON round trip
//! unchanged.

use crate::error::{Error, Result};
use crate::limits::{MAX_TIMESTAMP, MIN_TIMESTAMP};
use serde_json::{Number, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MILLIS_PER_SECOND: i64 = 1000;
const MILLIS_PER_CENTI: i64 = 10;
const CENTIS_PER_SECOND: i64 = 100;

const MIN_MILLIS: i64 = MIN_TIMESTAMP * MILLIS_PER_SECOND;
const MAX_MILLIS: i64 = MAX_TIMESTAMP * MILLIS_PER_SECOND;

/// An instant with millisecond precision, bounded to [`MIN_TIMESTAMP`]..=[`MAX_TIMESTAMP`] seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate {
    millis: i64,
}

impl NumericDate {
    /// The current time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert from `SystemTime`, keeping millisecond precision
    ///
    /// Times outside the supported range are clamped to its bounds.
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis: i128 = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_millis() as i128,
            Err(before) => -(before.duration().as_millis() as i128),
        };
        Self {
            millis: millis.clamp(MIN_MILLIS as i128, MAX_MILLIS as i128) as i64,
        }
    }

    /// Convert from `SystemTime`, rounding down to a hundredth of a second
    ///
    /// Used for `iat` of freshly issued tokens so it never lies in the future.
    pub(crate) fn truncated(time: SystemTime) -> Self {
        Self::from_system_time(time).floored()
    }

    /// Round down to the wire resolution of a hundredth of a second
    pub(crate) fn floored(self) -> Self {
        Self {
            millis: self.millis.div_euclid(MILLIS_PER_CENTI) * MILLIS_PER_CENTI,
        }
    }

    /// Build from seconds since the epoch
    ///
    /// The value must be finite and within bounds; it is rounded to two decimal places.
    pub fn from_seconds(seconds: f64) -> Result<Self> {
        Self::from_seconds_for("timestamp", seconds)
    }

    pub(crate) fn from_seconds_for(claim: &str, seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < MIN_TIMESTAMP as f64 || seconds > MAX_TIMESTAMP as f64
        {
            return Err(Error::InvalidTimestamp {
                claim: claim.to_string(),
                value: seconds,
                min: MIN_TIMESTAMP,
                max: MAX_TIMESTAMP,
            });
        }
        let centis = (seconds * CENTIS_PER_SECOND as f64).round() as i64;
        Ok(Self {
            millis: (centis * MILLIS_PER_CENTI).min(MAX_MILLIS),
        })
    }

    /// Build from a JSON number
    pub(crate) fn from_json_for(claim: &str, value: &Value) -> Result<Self> {
        let Some(number) = value.as_number() else {
            return Err(Error::InvalidTimestamp {
                claim: claim.to_string(),
                value: f64::NAN,
                min: MIN_TIMESTAMP,
                max: MAX_TIMESTAMP,
            });
        };

        // Whole seconds are converted exactly instead of going through f64
        if let Some(seconds) = number.as_i64() {
            if !(MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&seconds) {
                return Err(Error::InvalidTimestamp {
                    claim: claim.to_string(),
                    value: seconds as f64,
                    min: MIN_TIMESTAMP,
                    max: MAX_TIMESTAMP,
                });
            }
            return Ok(Self {
                millis: seconds * MILLIS_PER_SECOND,
            });
        }

        let seconds = number.as_f64().unwrap_or(f64::NAN);
        Self::from_seconds_for(claim, seconds)
    }

    /// Seconds since the epoch
    pub fn as_seconds(&self) -> f64 {
        self.millis as f64 / MILLIS_PER_SECOND as f64
    }

    /// Milliseconds since the epoch
    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    /// Convert to `SystemTime`
    pub fn to_system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.millis as u64)
    }

    /// Add a duration, clamping at the upper bound
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let add = duration.as_millis().min(i64::MAX as u128) as i64;
        Self {
            millis: self.millis.saturating_add(add).min(MAX_MILLIS),
        }
    }

    /// Signed distance from `other` to `self` in milliseconds
    pub fn millis_since(&self, other: &NumericDate) -> i64 {
        self.millis - other.millis
    }

    /// JSON projection rounded to two decimal places: an integer for whole seconds, a decimal otherwise
    pub fn to_json(&self) -> Value {
        // Round half up; dates are never negative
        let centis = (self.millis + MILLIS_PER_CENTI / 2) / MILLIS_PER_CENTI;
        if centis % CENTIS_PER_SECOND == 0 {
            Value::from(centis / CENTIS_PER_SECOND)
        } else {
            Number::from_f64(centis as f64 / CENTIS_PER_SECOND as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
    }
}

impl From<SystemTime> for NumericDate {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl From<NumericDate> for SystemTime {
    fn from(date: NumericDate) -> Self {
        date.to_system_time()
    }
}
