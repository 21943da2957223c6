//! Duration value type used by the schedule rule tables.

use std::ops::{Add, Mul, Neg};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A signed duration with millisecond resolution.
///
/// Intervals in the rule tables are plain constants; scaling by an ease
/// factor happens through [`Timedelta::scale`] (or `*`), which is why this
/// is not simply a `chrono::Duration` alias.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timedelta {
    millis: i64,
}

impl Timedelta {
    pub const ZERO: Self = Self { millis: 0 };

    /// Build a delta from structured components. Components may be negative;
    /// the result is their sum.
    pub const fn new(days: i64, hours: i64, minutes: i64, seconds: i64, milliseconds: i64) -> Self {
        let millis = milliseconds
            + seconds * 1_000
            + minutes * 60_000
            + hours * 3_600_000
            + days * 86_400_000;
        Self { millis }
    }

    pub const fn days(days: i64) -> Self {
        Self::new(days, 0, 0, 0, 0)
    }

    pub const fn hours(hours: i64) -> Self {
        Self::new(0, hours, 0, 0, 0)
    }

    pub const fn minutes(minutes: i64) -> Self {
        Self::new(0, 0, minutes, 0, 0)
    }

    pub const fn seconds(seconds: i64) -> Self {
        Self::new(0, 0, 0, seconds, 0)
    }

    pub const fn num_milliseconds(self) -> i64 {
        self.millis
    }

    /// Scale by a real factor, rounding to the nearest millisecond.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            millis: (self.millis as f64 * factor).round() as i64,
        }
    }

    /// Add this delta to an instant (`radd` in the original model).
    pub fn add_to(self, instant: DateTime<Utc>) -> DateTime<Utc> {
        instant + Duration::milliseconds(self.millis)
    }
}

impl Add for Timedelta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            millis: self.millis + rhs.millis,
        }
    }
}

impl Neg for Timedelta {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            millis: -self.millis,
        }
    }
}

impl Mul<f64> for Timedelta {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scale(factor)
    }
}

impl From<Timedelta> for Duration {
    fn from(delta: Timedelta) -> Self {
        Self::milliseconds(delta.millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_construction_sums_components() {
        let delta = Timedelta::new(1, 2, 3, 4, 5);
        assert_eq!(
            delta.num_milliseconds(),
            86_400_000 + 2 * 3_600_000 + 3 * 60_000 + 4_000 + 5
        );
    }

    #[test]
    fn addition_to_a_timestamp() {
        let t0 = Utc::now();
        assert_eq!(
            Timedelta::minutes(5).add_to(t0),
            t0 + Duration::minutes(5)
        );
        assert_eq!(Timedelta::ZERO.add_to(t0), t0);
    }

    #[test]
    fn negation_and_addition() {
        let delta = Timedelta::hours(3);
        assert_eq!(delta + (-delta), Timedelta::ZERO);
        assert_eq!((-delta).num_milliseconds(), -3 * 3_600_000);
    }

    #[test]
    fn scalar_multiplication_rounds_to_millis() {
        assert_eq!(Timedelta::hours(1) * 2.0, Timedelta::hours(2));
        assert_eq!(Timedelta::days(1) * 2.5, Timedelta::hours(60));
        assert_eq!(Timedelta::seconds(1) * 0.0015, Timedelta::new(0, 0, 0, 0, 2));
    }
}
