//! Integration tests for Layer 3: Engine
//!
//! Tests for the calculation service, ranges, the result cache and
//! custom collaborators.

mod cache;
mod collaborators;
mod range;
mod service;

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use zmanim_engine::{CalculationService, EngineConfig, InMemoryDirectory, StaticCalendar};
use zmanim_foundation::{
    FormulaDefinition, FormulaTag, LocalityId, Location, PublisherId, RoundingMode,
};

pub const PUBLISHER: PublisherId = PublisherId(1);
pub const LAKEWOOD: LocalityId = LocalityId(4993);
pub const JERUSALEM: LocalityId = LocalityId(281_184);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn lakewood() -> Location {
    Location::new(40.0828, -74.2094, Tz::America__New_York)
        .unwrap()
        .with_elevation(20.0)
        .with_name("Lakewood, NJ")
}

pub fn jerusalem() -> Location {
    Location::new(31.7683, 35.2137, Tz::Asia__Jerusalem)
        .unwrap()
        .with_elevation(754.0)
        .with_israel(true)
}

pub fn tag(text: &str) -> FormulaTag {
    text.parse().unwrap()
}

/// A small but realistic weekday and Shabbos formula set.
pub fn formulas() -> Vec<FormulaDefinition> {
    vec![
        FormulaDefinition::new("alos", "solar(16.1, before_sunrise)")
            .with_display_order(1)
            .with_rounding(RoundingMode::Floor),
        FormulaDefinition::new("sunrise", "visible_sunrise")
            .with_display_order(2)
            .with_rounding(RoundingMode::Ceil),
        FormulaDefinition::new("shma_mga", "proportional_hours(3, custom(@alos, @tzeis_72))")
            .with_display_order(3)
            .with_rounding(RoundingMode::Floor),
        FormulaDefinition::new("candles", "sunset - 18min")
            .with_tag(tag("shabbos"))
            .with_tag(tag("timing:day_before"))
            .with_display_order(4)
            .with_rounding(RoundingMode::Floor),
        FormulaDefinition::new("sunset", "visible_sunset").with_display_order(5),
        FormulaDefinition::new("havdalah", "solar(8.5, after_sunset)")
            .with_tag(tag("shabbos"))
            .with_tag(tag("timing:motzei"))
            .with_display_order(6)
            .with_rounding(RoundingMode::Ceil),
        FormulaDefinition::new("tzeis_72", "sunset + 72min")
            .with_display_order(7)
            .with_beta(true),
    ]
}

pub fn directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_locality(LAKEWOOD, lakewood());
    directory.insert_locality(JERUSALEM, jerusalem());
    directory.insert_publisher(PUBLISHER, formulas());
    directory
}

pub fn calendar() -> StaticCalendar {
    StaticCalendar::new()
        .with_day(date(2025, 12, 26), ["erev_shabbos", "chanukah"])
        .with_day(date(2025, 12, 27), ["shabbos", "chanukah"])
}

pub fn service(config: EngineConfig) -> CalculationService {
    CalculationService::with_directory(config, directory(), Arc::new(calendar()))
}
