//! Horizon definitions and elevation correction.

/// Zenith angle of the sun's centre on the geometric horizon.
pub const GEOMETRIC_ZENITH: f64 = 90.0;

/// Standard atmospheric refraction at the horizon, in degrees.
pub const REFRACTION: f64 = 34.0 / 60.0;

/// Apparent radius of the solar disk, in degrees.
pub const SOLAR_RADIUS: f64 = 16.0 / 60.0;

/// Depression angle of civil twilight.
pub const CIVIL_DEPRESSION: f64 = 6.0;

/// Depression angle of nautical twilight.
pub const NAUTICAL_DEPRESSION: f64 = 12.0;

/// Depression angle of astronomical twilight.
pub const ASTRONOMICAL_DEPRESSION: f64 = 18.0;

/// Mean earth radius used for the horizon dip, in kilometres.
const EARTH_RADIUS_KM: f64 = 6356.9;

/// The horizon a solar event is measured against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Horizon {
    /// Upper limb on the apparent horizon: refraction, solar radius and the
    /// dip seen from `elevation` meters.
    Visible {
        /// Observer elevation in meters.
        elevation: f64,
    },
    /// Sun's centre on the geometric horizon, no refraction.
    Geometric,
    /// Sun's centre this many degrees below the geometric horizon.
    Depression(f64),
}

impl Horizon {
    /// Visible horizon at sea level.
    pub const SEA_LEVEL: Self = Self::Visible { elevation: 0.0 };

    /// Zenith angle of the sun's centre at this horizon.
    #[must_use]
    pub fn zenith(self) -> f64 {
        match self {
            Self::Visible { elevation } => {
                GEOMETRIC_ZENITH + REFRACTION + SOLAR_RADIUS + elevation_dip(elevation)
            }
            Self::Geometric => GEOMETRIC_ZENITH,
            Self::Depression(degrees) => GEOMETRIC_ZENITH + degrees,
        }
    }
}

/// Dip of the visible horizon seen from `elevation` meters, in degrees.
#[must_use]
pub fn elevation_dip(elevation: f64) -> f64 {
    if elevation <= 0.0 {
        return 0.0;
    }
    (EARTH_RADIUS_KM / (EARTH_RADIUS_KM + elevation / 1000.0))
        .acos()
        .to_degrees()
}
