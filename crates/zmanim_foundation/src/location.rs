//! Geographic location of an evaluation.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// A place on earth, with publisher-specific overrides already applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable name, if known.
    #[serde(default)]
    pub name: Option<String>,
    /// Latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Elevation above sea level in meters.
    #[serde(default)]
    pub elevation: f64,
    /// IANA timezone used to present results.
    pub timezone: Tz,
    /// Whether the location is in Israel (used by calendar collaborators).
    #[serde(default)]
    pub is_israel: bool,
}

impl Location {
    /// Creates a location at sea level.
    ///
    /// # Errors
    /// Returns an error if latitude or longitude is out of range.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || latitude.is_nan() {
            return Err(Error::invalid_argument(format!(
                "latitude {latitude} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) || longitude.is_nan() {
            return Err(Error::invalid_argument(format!(
                "longitude {longitude} is outside -180..=180"
            )));
        }
        Ok(Self {
            name: None,
            latitude,
            longitude,
            elevation: 0.0,
            timezone,
            is_israel: false,
        })
    }

    /// Creates a location from a timezone name.
    ///
    /// # Errors
    /// Returns an error if the timezone is unknown or coordinates are out of range.
    pub fn with_timezone_name(latitude: f64, longitude: f64, timezone: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| Error::new(ErrorKind::InvalidTimezone(timezone.to_string())))?;
        Self::new(latitude, longitude, tz)
    }

    /// Sets the elevation in meters. Negative values are clamped to sea level.
    #[must_use]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation.max(0.0);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the location as in Israel.
    #[must_use]
    pub const fn with_israel(mut self, is_israel: bool) -> Self {
        self.is_israel = is_israel;
        self
    }

    /// Returns true for the southern hemisphere.
    #[must_use]
    pub fn is_southern(&self) -> bool {
        self.latitude < 0.0
    }
}
