//! Integration tests for locations and identifiers

use chrono_tz::Tz;
use zmanim_foundation::{ErrorKind, LocalityId, Location, PublisherId};

#[test]
fn location_from_timezone_name() {
    let location = Location::with_timezone_name(31.7683, 35.2137, "Asia/Jerusalem")
        .unwrap()
        .with_elevation(754.0)
        .with_name("Jerusalem")
        .with_israel(true);
    assert_eq!(location.timezone, Tz::Asia__Jerusalem);
    assert!(location.is_israel);
    assert_eq!(location.name.as_deref(), Some("Jerusalem"));
    assert!(!location.is_southern());
}

#[test]
fn negative_elevation_is_sea_level() {
    let location = Location::new(31.5, 35.4, Tz::Asia__Jerusalem)
        .unwrap()
        .with_elevation(-430.0);
    assert!(location.elevation.abs() < f64::EPSILON);
}

#[test]
fn coordinates_are_checked() {
    let err = Location::new(91.0, 0.0, Tz::UTC).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidArgument(_)));
    assert!(Location::new(0.0, -180.5, Tz::UTC).is_err());
    assert!(Location::new(f64::NAN, 0.0, Tz::UTC).is_err());
    assert!(Location::new(-90.0, 180.0, Tz::UTC).is_ok());
}

#[test]
fn unknown_timezone() {
    let err = Location::with_timezone_name(0.0, 0.0, "Mars/Olympus_Mons").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidTimezone(ref name) if name == "Mars/Olympus_Mons"));
}

#[test]
fn southern_hemisphere() {
    let melbourne = Location::new(-37.8136, 144.9631, Tz::Australia__Melbourne).unwrap();
    assert!(melbourne.is_southern());
}

#[test]
fn ids_display_and_compare() {
    assert_eq!(PublisherId::new(3).to_string(), "publisher#3");
    assert_eq!(LocalityId::new(4993).get(), 4993);
    assert!(LocalityId::new(1) < LocalityId::new(2));
}
