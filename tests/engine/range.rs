//! Integration tests for range calculation

use std::sync::Arc;

use zmanim_engine::{CalculationRequest, CalculationService, EngineConfig, RangeRequest};
use zmanim_foundation::{DiagnosticKind, ErrorKind, FormulaDefinition, PublisherId};

use crate::{LAKEWOOD, PUBLISHER, calendar, date, directory, formulas, service};

#[test]
fn week_matches_single_days() {
    let service = service(EngineConfig::uncached());
    let days = service
        .calculate_range(&RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 21), date(2025, 12, 27)))
        .unwrap();
    assert_eq!(days.len(), 7);
    for day in &days {
        let single = service
            .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, day.date))
            .unwrap();
        assert_eq!(day, &single, "{}", day.date);
    }
}

#[test]
fn dates_ascend_and_calendar_applies_per_day() {
    let service = service(EngineConfig::default());
    let days = service
        .calculate_range(&RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 25), date(2025, 12, 28)))
        .unwrap();
    let dates: Vec<_> = days.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        [date(2025, 12, 25), date(2025, 12, 26), date(2025, 12, 27), date(2025, 12, 28)]
    );
    let with_candles: Vec<_> = days
        .iter()
        .filter(|d| d.get("candles").is_some())
        .map(|d| d.date)
        .collect();
    assert_eq!(with_candles, [date(2025, 12, 26)]);
}

#[test]
fn single_key_over_a_month() {
    let service = service(EngineConfig::default());
    let request = RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 1), date(2025, 12, 31))
        .with_zman_key("sunset");
    let days = service.calculate_range(&request).unwrap();
    assert_eq!(days.len(), 31);
    assert!(days.iter().all(|d| d.zmanim.len() == 1 && d.zmanim[0].key == "sunset"));
    // Sunsets get later through December after the early-month minimum.
    let first = days[6].zmanim[0].instant.unwrap().time();
    let last = days[30].zmanim[0].instant.unwrap().time();
    assert!(last > first);
}

#[test]
fn year_is_the_limit() {
    let service = service(EngineConfig::default());
    let leap_year = RangeRequest::new(PUBLISHER, LAKEWOOD, date(2024, 1, 1), date(2024, 12, 31))
        .with_zman_key("sunrise");
    assert_eq!(leap_year.days(), Some(366));
    assert_eq!(service.calculate_range(&leap_year).unwrap().len(), 366);

    let too_long = RangeRequest::new(PUBLISHER, LAKEWOOD, date(2024, 1, 1), date(2025, 1, 1));
    let err = service.calculate_range(&too_long).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidRange(_)));
    assert!(err.to_string().contains("367"));
}

#[test]
fn inverted_range_is_rejected() {
    let service = service(EngineConfig::default());
    let request = RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 2, 1), date(2025, 1, 31));
    assert_eq!(request.days(), None);
    assert!(matches!(
        service.calculate_range(&request).unwrap_err().kind,
        ErrorKind::InvalidRange(_)
    ));
}

#[test]
fn unknown_publisher_fails_before_any_day() {
    let service = service(EngineConfig::default());
    let request = RangeRequest::new(PublisherId(42), LAKEWOOD, date(2025, 1, 1), date(2025, 1, 7));
    assert!(service.calculate_range(&request).is_err());
    assert!(service.cache().is_empty());
}

#[test]
fn repeated_range_is_served_from_cache() {
    let service = service(EngineConfig::default());
    let request = RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 3, 1), date(2025, 3, 10));
    let first = service.calculate_range(&request).unwrap();
    assert!(first.iter().all(|d| !d.from_cache));
    let second = service.calculate_range(&request).unwrap();
    assert!(second.iter().all(|d| d.from_cache));
    assert_eq!(service.cache().stats().hits, 10);

    let bypass = service.calculate_range(&request.clone().bypassing_cache()).unwrap();
    assert!(bypass.iter().all(|d| !d.from_cache));
}

#[test]
fn duplicate_keys_fail_each_day_but_not_the_range() {
    let directory = directory();
    let mut definitions = formulas();
    definitions.push(FormulaDefinition::new("sunset", "sunset + 1min"));
    directory.insert_publisher(PUBLISHER, definitions);
    let service =
        CalculationService::with_directory(EngineConfig::default(), directory, Arc::new(calendar()));

    let days = service
        .calculate_range(&RangeRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 22), date(2025, 12, 24)))
        .unwrap();
    assert_eq!(days.len(), 3);
    for day in &days {
        // Weekdays: the Shabbos-tagged candles and havdalah stay hidden.
        let keys: Vec<_> = day.keys().collect();
        assert_eq!(keys, ["alos", "sunrise", "shma_mga", "sunset", "sunset"]);
        assert!(day.zmanim.iter().all(|z| z.instant.is_none()));
        let diagnostic = day.zmanim[0].diagnostic.as_ref().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Evaluation);
        assert!(diagnostic.message.contains("duplicate"));
    }
    assert!(service.cache().is_empty());
}
