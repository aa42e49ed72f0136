//! Integration tests for Value types and duration helpers

use chrono::{TimeDelta, TimeZone, Utc};
use zmanim_foundation::{
    Value, ValueType, delta_minutes, format_duration, minutes_to_delta, scale_delta,
};

// =============================================================================
// Values
// =============================================================================

#[test]
fn value_accessors() {
    let t = Utc.with_ymd_and_hms(2025, 3, 20, 4, 12, 0).unwrap();
    assert_eq!(Value::from(t).as_instant(), Some(t));
    assert_eq!(Value::minutes(72.0).as_duration(), Some(TimeDelta::minutes(72)));
    assert_eq!(Value::from(16.1).as_number(), Some(16.1));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::text("winter").as_text(), Some("winter"));
    assert!(Value::Null.is_null());
    assert!(Value::Null.as_instant().is_none());
}

#[test]
fn missing_instant_is_null() {
    assert!(Value::from(None::<chrono::DateTime<Utc>>).is_null());
}

#[test]
fn value_types() {
    assert_eq!(Value::from(1.5).value_type(), ValueType::Number);
    assert_eq!(Value::Null.value_type(), ValueType::Null);
    assert_eq!(
        Value::from(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()).value_type(),
        ValueType::Instant
    );
}

#[test]
fn value_display() {
    let t = Utc.with_ymd_and_hms(2025, 3, 20, 4, 12, 5).unwrap();
    assert_eq!(Value::from(t).to_string(), "2025-03-20T04:12:05Z");
    assert_eq!(Value::minutes(72.0).to_string(), "1h 12min");
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::text("summer").to_string(), "\"summer\"");
}

// =============================================================================
// Durations
// =============================================================================

#[test]
fn fractional_minutes() {
    assert_eq!(minutes_to_delta(13.5), TimeDelta::seconds(13 * 60 + 30));
    assert!((delta_minutes(TimeDelta::seconds(90)) - 1.5).abs() < f64::EPSILON);
}

#[test]
fn scaling() {
    assert_eq!(scale_delta(TimeDelta::hours(12), 0.25), TimeDelta::hours(3));
    assert_eq!(scale_delta(TimeDelta::minutes(10), -1.0), TimeDelta::minutes(-10));
}

#[test]
fn huge_minutes_saturate() {
    assert_eq!(minutes_to_delta(f64::INFINITY), TimeDelta::MAX);
    assert_eq!(minutes_to_delta(f64::NEG_INFINITY), TimeDelta::MIN);
    assert_eq!(minutes_to_delta(f64::NAN), TimeDelta::zero());
}

#[test]
fn duration_formatting() {
    assert_eq!(format_duration(TimeDelta::zero()), "0s");
    assert_eq!(format_duration(TimeDelta::seconds(45)), "45s");
    assert_eq!(format_duration(TimeDelta::minutes(-18)), "-18min");
    assert_eq!(format_duration(TimeDelta::seconds(3600 + 30)), "1h 30s");
}
