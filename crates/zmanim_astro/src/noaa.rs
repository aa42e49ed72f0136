//! NOAA solar position equations.
//!
//! The low-precision ephemeris used by the NOAA solar calculator: mean
//! elements of the sun's orbit give declination and the equation of time,
//! which together locate solar noon and the hour angle of any zenith
//! crossing. Accuracy is well under a minute between latitudes ±72°.
//!
//! All angles are in degrees. Times are minutes after 00:00 UTC of the
//! requested date and may fall outside `0..1440`.

#![allow(clippy::unreadable_literal)]

use chrono::{Datelike, NaiveDate};

use crate::event::SolarEvent;

/// Julian day of 00:00 UTC on `date`.
#[must_use]
pub fn julian_day(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce()) + 1_721_424.5
}

/// Julian centuries since J2000.0.
#[must_use]
pub fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

fn geom_mean_longitude(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + 0.0003032 * t)).rem_euclid(360.0)
}

fn geom_mean_anomaly(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - 0.0001537 * t)
}

fn eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + 0.0000001267 * t)
}

fn equation_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

fn omega(t: f64) -> f64 {
    (125.04 - 1934.136 * t).to_radians()
}

fn apparent_longitude(t: f64) -> f64 {
    let true_longitude = geom_mean_longitude(t) + equation_of_center(t);
    true_longitude - 0.00569 - 0.00478 * omega(t).sin()
}

fn mean_obliquity(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.8150 + t * (0.00059 - t * 0.001813));
    23.0 + (26.0 + seconds / 60.0) / 60.0
}

fn obliquity_correction(t: f64) -> f64 {
    mean_obliquity(t) + 0.00256 * omega(t).cos()
}

/// Solar declination at julian century `t`.
#[must_use]
pub fn declination(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let lambda = apparent_longitude(t).to_radians();
    (epsilon.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes (apparent minus mean solar time).
#[must_use]
pub fn equation_of_time(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let l0 = geom_mean_longitude(t).to_radians();
    let e = eccentricity(t);
    let m = geom_mean_anomaly(t).to_radians();
    let y = (epsilon / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * eq.to_degrees()
}

/// Hour angle at which the sun's centre reaches `zenith`.
///
/// Returns the positive half-angle; rising uses `-h` from noon, setting `+h`.
#[must_use]
pub fn hour_angle(latitude: f64, declination: f64, zenith: f64) -> SolarEvent<f64> {
    let lat = latitude.to_radians();
    let dec = declination.to_radians();
    let cos_h = (zenith.to_radians().cos() - lat.sin() * dec.sin()) / (lat.cos() * dec.cos());

    if cos_h.is_nan() || cos_h > 1.0 {
        SolarEvent::AllNight
    } else if cos_h < -1.0 {
        SolarEvent::AllDay
    } else {
        SolarEvent::Occurs(cos_h.acos().to_degrees())
    }
}

/// Minutes after 00:00 UTC of the date at which the sun transits the meridian.
#[must_use]
pub fn solar_noon_minutes(date: NaiveDate, longitude: f64) -> f64 {
    let jd = julian_day(date);
    let estimate = 720.0 - 4.0 * longitude - equation_of_time(julian_century(jd + 0.5 - longitude / 360.0));
    720.0 - 4.0 * longitude - equation_of_time(julian_century(jd + estimate / 1440.0))
}

/// Which side of noon an event falls on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// Morning: the sun rises through the zenith angle.
    Rising,
    /// Evening: the sun sets through the zenith angle.
    Setting,
}

/// Minutes after 00:00 UTC of the date at which the sun's centre crosses
/// `zenith` on the given side of noon.
///
/// Starts from solar noon and refines declination and the equation of time
/// at the estimated event time.
#[must_use]
pub fn event_minutes(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    zenith: f64,
    crossing: Crossing,
) -> SolarEvent<f64> {
    let jd = julian_day(date);
    let mut minutes = solar_noon_minutes(date, longitude);

    for _ in 0..3 {
        let t = julian_century(jd + minutes / 1440.0);
        let h = match hour_angle(latitude, declination(t), zenith) {
            SolarEvent::Occurs(h) => h,
            polar => return polar,
        };
        let signed = match crossing {
            Crossing::Rising => h,
            Crossing::Setting => -h,
        };
        minutes = 720.0 - 4.0 * (longitude + signed) - equation_of_time(t);
    }

    SolarEvent::Occurs(minutes)
}
