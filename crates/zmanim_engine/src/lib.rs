//! Calculation service, range calculator and result cache for zmanim.
//!
//! This crate provides:
//! - [`CalculationService`] - One publisher's zmanim for one date, and
//!   ad-hoc formula previews
//! - [`RangeRequest`] - Consecutive dates with shared inputs loaded once
//! - [`ResultCache`] - Day results keyed by every input that affects them
//! - [`should_show`] and [`passes_flags`] - Which definitions apply
//! - [`LocationProvider`], [`FormulaSource`] and [`CalendarProvider`] - The
//!   collaborators that feed the engine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod collaborators;
pub mod config;
pub mod filter;
pub mod range;
pub mod rounding;
pub mod service;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use collaborators::{
    CalendarProvider, FormulaSource, InMemoryDirectory, LocationProvider, StaticCalendar,
};
pub use config::{DEFAULT_CACHE_TTL, DEFAULT_MAX_RANGE_DAYS, EngineConfig};
pub use filter::{DAY_BEFORE, MOTZEI, passes_flags, should_show};
pub use range::RangeRequest;
pub use rounding::{apply_rounding, round_to_minute};
pub use service::{CalculationRequest, CalculationService, FormulaPreview};
