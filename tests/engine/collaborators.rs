//! Integration tests for custom collaborators

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Datelike, NaiveDate, Weekday};
use zmanim_engine::{
    CalculationRequest, CalculationService, CalendarProvider, EngineConfig, FormulaSource,
    LocationProvider, RangeRequest, StaticCalendar,
};
use zmanim_foundation::{
    ActiveEvents, Error, ErrorKind, FormulaDefinition, LocalityId, Location, PublisherId, Result,
};

use crate::{JERUSALEM, LAKEWOOD, PUBLISHER, date, formulas, jerusalem, lakewood};

/// Two fixed localities, counting lookups.
#[derive(Default)]
struct CountingLocations {
    lookups: AtomicUsize,
}

impl LocationProvider for CountingLocations {
    fn location(&self, _publisher: PublisherId, locality: LocalityId) -> Result<Location> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match locality {
            LAKEWOOD => Ok(lakewood()),
            JERUSALEM => Ok(jerusalem()),
            other => Err(Error::new(ErrorKind::UnknownLocality(other))),
        }
    }
}

/// One publisher with the shared fixture formulas.
struct FixedFormulas;

impl FormulaSource for FixedFormulas {
    fn formulas(&self, publisher: PublisherId) -> Result<Vec<FormulaDefinition>> {
        if publisher == PUBLISHER {
            Ok(formulas())
        } else {
            Err(Error::new(ErrorKind::UnknownPublisher(publisher)))
        }
    }
}

/// Marks Fridays and Saturdays, counting single-date lookups.
#[derive(Default)]
struct WeeklyCalendar {
    single_lookups: AtomicUsize,
}

impl WeeklyCalendar {
    fn events_for(date: NaiveDate) -> ActiveEvents {
        match date.weekday() {
            Weekday::Fri => ["erev_shabbos"].into_iter().collect(),
            Weekday::Sat => ["shabbos"].into_iter().collect(),
            _ => ActiveEvents::new(),
        }
    }
}

impl CalendarProvider for WeeklyCalendar {
    fn active_events(&self, date: NaiveDate, _location: &Location) -> ActiveEvents {
        self.single_lookups.fetch_add(1, Ordering::Relaxed);
        Self::events_for(date)
    }

    fn active_events_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        _location: &Location,
    ) -> Vec<ActiveEvents> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(Self::events_for)
            .collect()
    }
}

fn custom_service() -> (CalculationService, Arc<CountingLocations>, Arc<WeeklyCalendar>) {
    let locations = Arc::new(CountingLocations::default());
    let calendar = Arc::new(WeeklyCalendar::default());
    let service = CalculationService::new(
        EngineConfig::uncached(),
        locations.clone(),
        Arc::new(FixedFormulas),
        calendar.clone(),
    );
    (service, locations, calendar)
}

#[test]
fn custom_providers_drive_a_day() {
    let (service, locations, calendar) = custom_service();
    // 2025-03-21 is a Friday.
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, JERUSALEM, date(2025, 3, 21)))
        .unwrap();
    assert!(day.get("candles").is_some());
    assert_eq!(locations.lookups.load(Ordering::Relaxed), 1);
    assert_eq!(calendar.single_lookups.load(Ordering::Relaxed), 1);
}

#[test]
fn range_uses_one_location_lookup_and_the_batch_calendar() {
    let (service, locations, calendar) = custom_service();
    let days = service
        .calculate_range(&RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 3, 16), date(2025, 3, 29)))
        .unwrap();
    assert_eq!(days.len(), 14);
    assert_eq!(locations.lookups.load(Ordering::Relaxed), 1);
    assert_eq!(calendar.single_lookups.load(Ordering::Relaxed), 0);

    let candle_days: Vec<_> = days
        .iter()
        .filter(|d| d.get("candles").is_some())
        .map(|d| d.date)
        .collect();
    assert_eq!(candle_days, [date(2025, 3, 21), date(2025, 3, 28)]);
    let havdalah_days: Vec<_> = days
        .iter()
        .filter(|d| d.get("havdalah").is_some())
        .map(|d| d.date)
        .collect();
    assert_eq!(havdalah_days, [date(2025, 3, 22), date(2025, 3, 29)]);
}

#[test]
fn provider_errors_surface() {
    let (service, _, _) = custom_service();
    let err = service
        .calculate(&CalculationRequest::new(PUBLISHER, LocalityId(7), date(2025, 3, 21)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownLocality(LocalityId(7))));
    let err = service
        .calculate(&CalculationRequest::new(PublisherId(7), LAKEWOOD, date(2025, 3, 21)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownPublisher(PublisherId(7))));
}

#[test]
fn default_range_lookup_asks_each_date() {
    let calendar = StaticCalendar::new()
        .with_day(date(2025, 4, 12), ["shabbos", "erev_pesach"])
        .with_day(date(2025, 4, 13), ["pesach"]);
    let days = calendar.active_events_range(date(2025, 4, 11), date(2025, 4, 14), &lakewood());
    assert_eq!(days.len(), 4);
    assert!(days[0].is_empty());
    assert!(days[1].contains("erev_pesach"));
    assert!(days[2].contains("pesach"));
    assert!(days[3].is_empty());

    assert!(
        calendar
            .active_events_range(date(2025, 4, 14), date(2025, 4, 11), &lakewood())
            .is_empty()
    );
}
