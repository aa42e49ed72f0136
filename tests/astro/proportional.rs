//! Integration tests for proportional hours

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use zmanim_astro::{
    SolarCalculator, midpoint, proportional_minutes, proportional_time, shaah_zmanis,
};

#[test]
fn shaah_zmanis_is_a_twelfth_of_the_day() {
    let start = Utc.with_ymd_and_hms(2025, 3, 20, 6, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap();
    assert_eq!(shaah_zmanis(start, end), Some(TimeDelta::hours(1)));
    assert_eq!(shaah_zmanis(end, start), None);
    assert_eq!(shaah_zmanis(start, start), None);
}

#[test]
fn proportional_time_walks_the_day() {
    let start = Utc.with_ymd_and_hms(2025, 3, 20, 5, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 20, 17, 0, 0).unwrap();
    assert_eq!(
        proportional_time(start, end, 3.0),
        Some(Utc.with_ymd_and_hms(2025, 3, 20, 8, 0, 0).unwrap())
    );
    assert_eq!(proportional_time(start, end, 6.0), Some(midpoint(start, end)));
    assert_eq!(proportional_time(start, end, 12.0), Some(end));
    assert_eq!(proportional_time(end, start, 3.0), None);
}

#[test]
fn proportional_minutes_scale_with_day_length() {
    assert_eq!(
        proportional_minutes(TimeDelta::hours(12), 72.0),
        TimeDelta::minutes(72)
    );
    assert_eq!(
        proportional_minutes(TimeDelta::hours(9), 72.0),
        TimeDelta::minutes(54)
    );
}

#[test]
fn gra_chatzos_is_near_solar_noon() {
    let calc = SolarCalculator::new(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(), 31.7683, 35.2137, 0.0);
    let sunrise = calc.sunrise().instant().unwrap();
    let sunset = calc.sunset().instant().unwrap();
    let chatzos = proportional_time(sunrise, sunset, 6.0).unwrap();
    assert!((chatzos - calc.solar_noon()).num_seconds().abs() < 60);
}
