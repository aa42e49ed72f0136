//! Presenting calculated instants as local clock times.

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};
use zmanim_foundation::RoundingMode;

/// Formats `t` as an exact `HH:MM:SS` time and a `HH:MM` time rounded per `mode`.
#[must_use]
pub fn apply_rounding(t: DateTime<FixedOffset>, mode: RoundingMode) -> (String, String) {
    let exact = t.format("%H:%M:%S").to_string();
    let rounded = round_to_minute(t, mode).format("%H:%M").to_string();
    (exact, rounded)
}

/// Rounds `t` to a whole minute.
#[must_use]
pub fn round_to_minute(t: DateTime<FixedOffset>, mode: RoundingMode) -> DateTime<FixedOffset> {
    let floor = t
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t);
    let round_up = match mode {
        RoundingMode::Floor => false,
        RoundingMode::Ceil => floor != t,
        RoundingMode::Math => t.second() >= 30,
    };
    if round_up {
        floor + TimeDelta::minutes(1)
    } else {
        floor
    }
}
