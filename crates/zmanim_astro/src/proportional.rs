//! Proportional ("seasonal") hours.
//!
//! A halachic day from `start` to `end` is split into twelve equal hours.
//! Times inside it are located by fractions of that span.

use chrono::{DateTime, TimeDelta, Utc};
use zmanim_foundation::scale_delta;

/// Length of one proportional hour between `start` and `end`.
///
/// Returns `None` unless `end` is after `start`.
#[must_use]
pub fn shaah_zmanis(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<TimeDelta> {
    (end > start).then(|| (end - start) / 12)
}

/// The instant `hours` proportional hours after `start`.
///
/// Returns `None` unless `end` is after `start`, or if the result falls
/// outside the representable range of instants.
#[must_use]
pub fn proportional_time(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hours: f64,
) -> Option<DateTime<Utc>> {
    if end <= start {
        return None;
    }
    start.checked_add_signed(scale_delta(end - start, hours / 12.0))
}

/// Offset of `minutes` proportional minutes, a minute being 1/720 of `day`.
#[must_use]
pub fn proportional_minutes(day: TimeDelta, minutes: f64) -> TimeDelta {
    scale_delta(day, minutes / 720.0)
}

/// Instant halfway between `a` and `b`.
#[must_use]
pub fn midpoint(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a + (b - a) / 2
}
