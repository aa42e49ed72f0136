//! Solar events for one date at one place.

use std::cell::OnceCell;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use zmanim_foundation::{Location, minutes_to_delta, scale_delta};

use crate::event::{SolarEvent, SolarEventResult};
use crate::horizon::{ASTRONOMICAL_DEPRESSION, CIVIL_DEPRESSION, Horizon, NAUTICAL_DEPRESSION};
use crate::noaa::{self, Crossing};

/// Month and day used as the reference equinox for seasonal angles.
const EQUINOX: (u32, u32) = (3, 20);

/// Sunrise, sunset and noon for a date, as used by most formulas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SunTimes {
    /// Visible sunrise, if the sun rises.
    pub sunrise: Option<DateTime<Utc>>,
    /// Visible sunset, if the sun sets.
    pub sunset: Option<DateTime<Utc>>,
    /// Meridian transit.
    pub solar_noon: DateTime<Utc>,
}

impl SunTimes {
    /// Visible sunset minus visible sunrise.
    #[must_use]
    pub fn day_length(&self) -> Option<TimeDelta> {
        Some(self.sunset? - self.sunrise?)
    }
}

/// Calculates solar events for one local date at one place.
///
/// The visible sunrise, sunset and noon are computed on first use and
/// cached; other events are computed on demand.
#[derive(Debug)]
pub struct SolarCalculator {
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    elevation: f64,
    sunrise: OnceCell<SolarEventResult>,
    sunset: OnceCell<SolarEventResult>,
    noon: OnceCell<DateTime<Utc>>,
}

impl SolarCalculator {
    /// Creates a calculator for the given date and coordinates.
    #[must_use]
    pub fn new(date: NaiveDate, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            date,
            latitude,
            longitude,
            elevation: elevation.max(0.0),
            sunrise: OnceCell::new(),
            sunset: OnceCell::new(),
            noon: OnceCell::new(),
        }
    }

    /// Creates a calculator for a location.
    #[must_use]
    pub fn for_location(date: NaiveDate, location: &Location) -> Self {
        Self::new(
            date,
            location.latitude,
            location.longitude,
            location.elevation,
        )
    }

    /// Returns the date this calculator is for.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Computes the time the sun crosses `horizon` on the given side of noon.
    #[must_use]
    pub fn event(&self, horizon: Horizon, crossing: Crossing) -> SolarEventResult {
        noaa::event_minutes(
            self.date,
            self.latitude,
            self.longitude,
            horizon.zenith(),
            crossing,
        )
        .map(|minutes| self.at_minutes(minutes))
    }

    fn at_minutes(&self, minutes: f64) -> DateTime<Utc> {
        self.date.and_time(NaiveTime::MIN).and_utc() + minutes_to_delta(minutes)
    }

    fn visible(&self) -> Horizon {
        Horizon::Visible {
            elevation: self.elevation,
        }
    }

    /// Visible sunrise, corrected for elevation.
    pub fn sunrise(&self) -> SolarEventResult {
        *self
            .sunrise
            .get_or_init(|| self.event(self.visible(), Crossing::Rising))
    }

    /// Visible sunset, corrected for elevation.
    pub fn sunset(&self) -> SolarEventResult {
        *self
            .sunset
            .get_or_init(|| self.event(self.visible(), Crossing::Setting))
    }

    /// Sun's centre on the geometric horizon in the morning.
    #[must_use]
    pub fn geometric_sunrise(&self) -> SolarEventResult {
        self.event(Horizon::Geometric, Crossing::Rising)
    }

    /// Sun's centre on the geometric horizon in the evening.
    #[must_use]
    pub fn geometric_sunset(&self) -> SolarEventResult {
        self.event(Horizon::Geometric, Crossing::Setting)
    }

    /// Meridian transit. Always defined.
    pub fn solar_noon(&self) -> DateTime<Utc> {
        *self.noon.get_or_init(|| {
            self.at_minutes(noaa::solar_noon_minutes(self.date, self.longitude))
        })
    }

    /// Twelve hours before solar noon.
    pub fn solar_midnight(&self) -> DateTime<Utc> {
        self.solar_noon() - TimeDelta::hours(12)
    }

    /// Morning time at which the sun is `degrees` below the horizon.
    #[must_use]
    pub fn dawn(&self, degrees: f64) -> SolarEventResult {
        self.event(Horizon::Depression(degrees), Crossing::Rising)
    }

    /// Evening time at which the sun is `degrees` below the horizon.
    #[must_use]
    pub fn dusk(&self, degrees: f64) -> SolarEventResult {
        self.event(Horizon::Depression(degrees), Crossing::Setting)
    }

    /// Civil dawn (6°).
    #[must_use]
    pub fn civil_dawn(&self) -> SolarEventResult {
        self.dawn(CIVIL_DEPRESSION)
    }

    /// Civil dusk (6°).
    #[must_use]
    pub fn civil_dusk(&self) -> SolarEventResult {
        self.dusk(CIVIL_DEPRESSION)
    }

    /// Nautical dawn (12°).
    #[must_use]
    pub fn nautical_dawn(&self) -> SolarEventResult {
        self.dawn(NAUTICAL_DEPRESSION)
    }

    /// Nautical dusk (12°).
    #[must_use]
    pub fn nautical_dusk(&self) -> SolarEventResult {
        self.dusk(NAUTICAL_DEPRESSION)
    }

    /// Astronomical dawn (18°).
    #[must_use]
    pub fn astronomical_dawn(&self) -> SolarEventResult {
        self.dawn(ASTRONOMICAL_DEPRESSION)
    }

    /// Astronomical dusk (18°).
    #[must_use]
    pub fn astronomical_dusk(&self) -> SolarEventResult {
        self.dusk(ASTRONOMICAL_DEPRESSION)
    }

    /// Visible sunrise, sunset and noon together.
    pub fn sun_times(&self) -> SunTimes {
        SunTimes {
            sunrise: self.sunrise().instant(),
            sunset: self.sunset().instant(),
            solar_noon: self.solar_noon(),
        }
    }

    /// Visible sunset minus visible sunrise.
    pub fn day_length(&self) -> Option<TimeDelta> {
        self.sun_times().day_length()
    }

    fn equinox(&self) -> Option<Self> {
        let (month, day) = EQUINOX;
        let date = NaiveDate::from_ymd_opt(chrono::Datelike::year(&self.date), month, day)?;
        Some(Self::new(date, self.latitude, self.longitude, self.elevation))
    }

    /// Seasonal dawn: the equinox interval between `degrees` dawn and sunrise,
    /// scaled by today's day length over the equinox day length and taken
    /// before today's sunrise.
    pub fn seasonal_dawn(&self, degrees: f64) -> Option<DateTime<Utc>> {
        let equinox = self.equinox()?;
        let offset = equinox.sunrise().instant()? - equinox.dawn(degrees).instant()?;
        let ratio = self.day_length_ratio(&equinox)?;
        Some(self.sunrise().instant()? - scale_delta(offset, ratio))
    }

    /// Seasonal dusk: the evening counterpart of [`Self::seasonal_dawn`].
    pub fn seasonal_dusk(&self, degrees: f64) -> Option<DateTime<Utc>> {
        let equinox = self.equinox()?;
        let offset = equinox.dusk(degrees).instant()? - equinox.sunset().instant()?;
        let ratio = self.day_length_ratio(&equinox)?;
        Some(self.sunset().instant()? + scale_delta(offset, ratio))
    }

    #[allow(clippy::cast_precision_loss)]
    fn day_length_ratio(&self, equinox: &Self) -> Option<f64> {
        let today = self.day_length()?.num_milliseconds() as f64;
        let reference = equinox.day_length()?.num_milliseconds() as f64;
        (reference > 0.0).then(|| today / reference)
    }
}

/// Returns true if the sun never rises or never sets on this date here.
#[must_use]
pub fn is_polar(calculator: &SolarCalculator) -> bool {
    matches!(calculator.sunrise(), SolarEvent::AllDay | SolarEvent::AllNight)
        || calculator.sunset().is_polar()
}
