//! Outcome of a solar event search.

use chrono::{DateTime, Utc};

/// Result of a solar event calculation (sunrise, sunset, twilight, etc.).
///
/// At high latitudes the sun may never cross the requested threshold on a
/// given day; those cases are values, not errors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SolarEvent<T> {
    /// The event occurs at the given time.
    Occurs(T),
    /// The sun stays above the threshold all day (midnight sun).
    AllDay,
    /// The sun stays below the threshold all day (polar night).
    AllNight,
}

/// A solar event located in time.
pub type SolarEventResult = SolarEvent<DateTime<Utc>>;

impl<T> SolarEvent<T> {
    /// Returns the time if the event occurs.
    pub fn occurs(self) -> Option<T> {
        match self {
            Self::Occurs(t) => Some(t),
            Self::AllDay | Self::AllNight => None,
        }
    }

    /// Maps the occurrence time.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SolarEvent<U> {
        match self {
            Self::Occurs(t) => SolarEvent::Occurs(f(t)),
            Self::AllDay => SolarEvent::AllDay,
            Self::AllNight => SolarEvent::AllNight,
        }
    }

    /// Returns true if the sun never crosses the threshold today.
    pub const fn is_polar(&self) -> bool {
        matches!(self, Self::AllDay | Self::AllNight)
    }
}

impl SolarEventResult {
    /// Returns the instant if the event occurs.
    #[must_use]
    pub fn instant(self) -> Option<DateTime<Utc>> {
        self.occurs()
    }
}
