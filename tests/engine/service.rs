//! Integration tests for single-day calculation and previews

use std::sync::Arc;

use zmanim_engine::{CalculationRequest, CalculationService, EngineConfig, StaticCalendar};
use zmanim_foundation::{
    ActiveEvents, CalcFlags, DiagnosticKind, ErrorKind, FormulaDefinition, LocalityId,
    PublisherId, RoundingMode, Value,
};

use crate::{JERUSALEM, LAKEWOOD, PUBLISHER, date, directory, jerusalem, lakewood, service};

// =============================================================================
// Tag filtering
// =============================================================================

#[test]
fn erev_shabbos_shows_candles_only() {
    let service = service(EngineConfig::default());
    let friday = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26)))
        .unwrap();
    assert!(friday.get("candles").is_some());
    assert!(friday.get("havdalah").is_none());

    let shabbos = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 27)))
        .unwrap();
    assert!(shabbos.get("candles").is_none());
    assert!(shabbos.get("havdalah").is_some());
}

#[test]
fn weekday_has_no_shabbos_times() {
    let service = service(EngineConfig::default());
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)))
        .unwrap();
    let keys: Vec<&str> = day.keys().collect();
    assert_eq!(keys, ["alos", "sunrise", "shma_mga", "sunset"]);
}

#[test]
fn include_inactive_marks_instead_of_dropping() {
    let service = service(EngineConfig::default());
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)).with_flags(
        CalcFlags {
            include_inactive: true,
            ..CalcFlags::default()
        },
    );
    let day = service.calculate(&request).unwrap();
    let candles = day.get("candles").unwrap();
    assert!(!candles.is_active_today);
    assert!(candles.is_valid());
    assert!(day.get("sunrise").unwrap().is_active_today);
}

#[test]
fn explicit_events_override_the_calendar() {
    let service = service(EngineConfig::default());
    let events: ActiveEvents = ["erev_shabbos"].into_iter().collect();
    let request =
        CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)).with_events(events);
    assert!(service.calculate(&request).unwrap().get("candles").is_some());
}

// =============================================================================
// Flags and references
// =============================================================================

#[test]
fn beta_reference_is_undefined_until_included() {
    let service = service(EngineConfig::default());
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)))
        .unwrap();
    let shma = day.get("shma_mga").unwrap();
    assert!(!shma.is_valid());
    assert_eq!(
        shma.diagnostic.as_ref().unwrap().kind,
        DiagnosticKind::UndefinedReference
    );

    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)).with_flags(
        CalcFlags {
            include_beta: true,
            ..CalcFlags::default()
        },
    );
    let day = service.calculate(&request).unwrap();
    assert!(day.get("shma_mga").unwrap().is_valid());
    assert!(day.get("tzeis_72").is_some());
}

#[test]
fn strict_references_fail_the_formula() {
    let service = service(EngineConfig::strict());
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)))
        .unwrap();
    let shma = day.get("shma_mga").unwrap();
    assert!(!shma.is_valid());
    assert_eq!(
        shma.diagnostic.as_ref().unwrap().kind,
        DiagnosticKind::UndefinedReference
    );
    assert!(shma.diagnostic.as_ref().unwrap().message.contains("tzeis_72"));
    assert!(day.get("sunrise").unwrap().is_valid());
}

#[test]
fn results_are_in_local_time_with_rounding() {
    let service = service(EngineConfig::default());
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26)))
        .unwrap();
    let candles = day.get("candles").unwrap();
    let instant = candles.instant.unwrap();
    // EST is five hours behind UTC in December.
    assert_eq!(instant.offset().local_minus_utc(), -5 * 3600);
    assert_eq!(candles.rounding, RoundingMode::Floor);
    let exact = candles.time_exact.as_deref().unwrap();
    let rounded = candles.time_rounded.as_deref().unwrap();
    assert_eq!(&exact[..5], rounded);
    // Candle lighting in Lakewood in late December is in the 16:00 hour.
    assert!(rounded.starts_with("16:"), "{rounded}");
}

#[test]
fn same_publisher_differs_by_locality() {
    let service = service(EngineConfig::default());
    let here = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)))
        .unwrap();
    let there = service
        .calculate(&CalculationRequest::new(PUBLISHER, JERUSALEM, date(2025, 12, 23)))
        .unwrap();
    assert_ne!(
        here.get("sunrise").unwrap().instant,
        there.get("sunrise").unwrap().instant
    );
}

// =============================================================================
// Request errors
// =============================================================================

#[test]
fn unknown_publisher_and_locality() {
    let service = service(EngineConfig::default());
    let err = service
        .calculate(&CalculationRequest::new(PublisherId(99), LAKEWOOD, date(2025, 1, 1)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownPublisher(PublisherId(99))));
    assert!(err.is_request_error());

    let err = service
        .calculate(&CalculationRequest::new(PUBLISHER, LocalityId(7), date(2025, 1, 1)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownLocality(LocalityId(7))));
}

#[test]
fn one_broken_formula_does_not_fail_the_day() {
    let directory = directory();
    directory
        .upsert_formula(PUBLISHER, FormulaDefinition::new("broken", "sunrise +"))
        .unwrap();
    let service = CalculationService::with_directory(
        EngineConfig::default(),
        directory,
        Arc::new(StaticCalendar::new()),
    );
    let day = service
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 23)))
        .unwrap();
    assert_eq!(
        day.get("broken").unwrap().diagnostic.as_ref().unwrap().kind,
        DiagnosticKind::Syntax
    );
    assert!(day.get("sunrise").unwrap().is_valid());
}

// =============================================================================
// Preview
// =============================================================================

#[test]
fn preview_explains_a_formula() {
    let service = service(EngineConfig::default());
    let preview = service
        .preview_formula(
            "earlier_of(solar(16.1, before_sunrise), sunrise - 72min)",
            &jerusalem(),
            date(2025, 6, 21),
            &ActiveEvents::new(),
            None,
        )
        .unwrap();
    assert!(preview.instant.is_some());
    assert!(preview.diagnostic.is_none());
    assert_eq!(preview.breakdown.len(), 3);
    assert!(preview.breakdown[2].expression.starts_with("earlier_of("));
    assert!(preview.time_rounded.is_some());
}

#[test]
fn preview_uses_supplied_references() {
    let service = service(EngineConfig::default());
    let definitions = [FormulaDefinition::new("shkia", "sunset")];
    let preview = service
        .preview_formula(
            "@shkia - 18min",
            &lakewood(),
            date(2025, 12, 26),
            &ActiveEvents::new(),
            Some(&definitions),
        )
        .unwrap();
    assert!(preview.instant.is_some());

    let preview = service
        .preview_formula(
            "@shkia - 18min",
            &lakewood(),
            date(2025, 12, 26),
            &ActiveEvents::new(),
            None,
        )
        .unwrap();
    assert_eq!(preview.value, Value::Null);
    assert_eq!(
        preview.diagnostic.unwrap().kind,
        DiagnosticKind::UndefinedReference
    );
}

#[test]
fn preview_rejects_unparsable_text() {
    let service = service(EngineConfig::default());
    let err = service
        .preview_formula("solar(", &lakewood(), date(2025, 1, 1), &ActiveEvents::new(), None)
        .unwrap_err();
    assert!(err.is_parse_error());
}
