//! Runtime values produced by evaluating a formula.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::ValueType;

/// A value produced while evaluating a formula.
///
/// Values are immutable and cheaply cloneable. `Null` stands for an
/// astronomically undefined instant (polar day or night) and propagates
/// through arithmetic.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No event.
    Null,
    /// A point in time.
    Instant(DateTime<Utc>),
    /// A signed span of time.
    Duration(TimeDelta),
    /// A plain number (degrees, hours, day of year).
    Number(f64),
    /// A truth value.
    Bool(bool),
    /// A string (season names).
    Text(Arc<str>),
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Instant(_) => ValueType::Instant,
            Self::Duration(_) => ValueType::Duration,
            Self::Number(_) => ValueType::Number,
            Self::Bool(_) => ValueType::Bool,
            Self::Text(_) => ValueType::Text,
        }
    }

    /// Creates a text value.
    #[must_use]
    pub fn text(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }

    /// Creates a duration value from fractional minutes.
    #[must_use]
    pub fn minutes(minutes: f64) -> Self {
        Self::Duration(minutes_to_delta(minutes))
    }

    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to extract an instant.
    #[must_use]
    pub const fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Instant(t) => Some(*t),
            _ => None,
        }
    }

    /// Attempts to extract a duration.
    #[must_use]
    pub const fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Attempts to extract a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract a string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Instant(t)
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(t: Option<DateTime<Utc>>) -> Self {
        t.map_or(Self::Null, Self::Instant)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Self::Duration(d)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Instant(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%SZ")),
            Self::Duration(d) => f.write_str(&format_duration(*d)),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

// =============================================================================
// Duration helpers
// =============================================================================

/// Builds a `TimeDelta` from fractional milliseconds, saturating at its bounds.
#[allow(clippy::cast_possible_truncation)]
fn saturating_millis(ms: f64) -> TimeDelta {
    if ms.is_nan() {
        return TimeDelta::zero();
    }
    let ms = ms.round() as i64;
    TimeDelta::try_milliseconds(ms).unwrap_or(if ms < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// Converts fractional minutes to a `TimeDelta`, rounded to the millisecond.
#[must_use]
pub fn minutes_to_delta(minutes: f64) -> TimeDelta {
    saturating_millis(minutes * 60_000.0)
}

/// Converts a `TimeDelta` to fractional minutes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn delta_minutes(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 60_000.0
}

/// Multiplies a `TimeDelta` by a real factor, rounded to the millisecond.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scale_delta(delta: TimeDelta, factor: f64) -> TimeDelta {
    saturating_millis(delta.num_milliseconds() as f64 * factor)
}

/// Formats a duration as `1h 12min 30s`, omitting zero components.
#[must_use]
pub fn format_duration(delta: TimeDelta) -> String {
    let negative = delta < TimeDelta::zero();
    let total = delta.num_seconds().unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}min"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }

    let body = parts.join(" ");
    if negative { format!("-{body}") } else { body }
}
