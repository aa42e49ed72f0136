//! Solar astronomy for the zmanim engine.
//!
//! This crate provides:
//! - [`noaa`] - The NOAA solar position equations
//! - [`Horizon`] - Visible, geometric and depression-angle horizons
//! - [`SolarCalculator`] - Sunrise, sunset, noon and twilight for a date and place
//! - [`SolarEvent`] - Occurrence or polar outcome of an event
//! - [`proportional`] - Proportional hours and midpoints

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod calculator;
pub mod event;
pub mod horizon;
pub mod noaa;
pub mod proportional;

pub use calculator::{SolarCalculator, SunTimes, is_polar};
pub use event::{SolarEvent, SolarEventResult};
pub use horizon::{
    ASTRONOMICAL_DEPRESSION, CIVIL_DEPRESSION, Horizon, NAUTICAL_DEPRESSION, elevation_dip,
};
pub use noaa::Crossing;
pub use proportional::{midpoint, proportional_minutes, proportional_time, shaah_zmanis};
