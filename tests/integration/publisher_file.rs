//! Publisher file integration tests
//!
//! Load a TOML formula set, calculate with it and check it.

use zmanim_engine::{CalculationRequest, EngineConfig, RangeRequest};
use zmanim_foundation::{CalcFlags, DiagnosticKind, ErrorKind, LocalityId, PublisherId};
use zmanim_runtime::{OutputFormat, PublisherFile, render_day, render_range};

use crate::{date, lakewood_file};

// =============================================================================
// Loading
// =============================================================================

#[test]
fn demo_file_loads() {
    let file = lakewood_file();
    assert_eq!(file.publisher_id(), PublisherId(1));
    assert_eq!(file.locality_id(), LocalityId(4993));
    let location = file.location().unwrap();
    assert_eq!(location.name.as_deref(), Some("Lakewood, NJ"));
    assert_eq!(location.timezone.name(), "America/New_York");
    assert_eq!(file.definitions().unwrap().len(), 13);
}

#[test]
fn demo_file_checks_clean() {
    assert!(lakewood_file().check().is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let err = PublisherFile::load("/nonexistent/zmanim.toml").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}

#[test]
fn bad_event_date_is_rejected() {
    let file = PublisherFile::parse(
        r#"
        [locality]
        id = 1
        latitude = 31.77
        longitude = 35.21
        timezone = "Asia/Jerusalem"

        [events]
        "next friday" = ["erev_shabbos"]
        "#,
    )
    .unwrap();
    assert!(file.calendar().is_err());
    assert!(file.service(EngineConfig::default()).is_err());
}

// =============================================================================
// Calculating
// =============================================================================

#[test]
fn friday_in_lakewood() {
    let file = lakewood_file();
    let service = file.service(EngineConfig::default()).unwrap();
    let day = service
        .calculate(&CalculationRequest::new(file.publisher_id(), file.locality_id(), date(2025, 12, 26)))
        .unwrap();

    let keys: Vec<&str> = day.keys().collect();
    assert_eq!(
        keys,
        [
            "alos_hashachar",
            "misheyakir",
            "sunrise",
            "sof_zman_shma_gra",
            "sof_zman_shma_mga",
            "chatzos",
            "mincha_gedola",
            "plag_hamincha",
            "candle_lighting",
            "shkia",
            "tzais",
        ]
    );
    assert!(day.zmanim.iter().all(|z| z.is_valid()));

    let instants: Vec<_> = ["alos_hashachar", "misheyakir", "sunrise", "chatzos", "shkia", "tzais"]
        .iter()
        .map(|k| day.get(k).unwrap().instant.unwrap())
        .collect();
    assert!(instants.windows(2).all(|w| w[0] < w[1]));

    // Winter mincha gedola is held to half an hour after noon.
    let noon = day.get("chatzos").unwrap().instant.unwrap();
    let gedola = day.get("mincha_gedola").unwrap().instant.unwrap();
    assert!((gedola - noon).num_seconds() >= 30 * 60);

    // December candle lighting in Lakewood is around 16:15.
    let candles = day.get("candle_lighting").unwrap();
    assert!(candles.time_rounded.as_deref().unwrap().starts_with("16:"));
}

#[test]
fn shabbos_shows_havdalah_after_tzais() {
    let file = lakewood_file();
    let service = file.service(EngineConfig::default()).unwrap();
    let day = service
        .calculate(&CalculationRequest::new(file.publisher_id(), file.locality_id(), date(2025, 12, 27)))
        .unwrap();
    assert!(day.get("candle_lighting").is_none());
    let tzais = day.get("tzais").unwrap().instant.unwrap();
    let havdalah = day.get("havdalah").unwrap().instant.unwrap();
    assert_eq!((havdalah - tzais).num_minutes(), 5);
}

#[test]
fn beta_formula_needs_the_flag() {
    let file = lakewood_file();
    let service = file.service(EngineConfig::default()).unwrap();
    let request = CalculationRequest::new(file.publisher_id(), file.locality_id(), date(2025, 12, 23));
    assert!(service.calculate(&request).unwrap().get("tzais_rt").is_none());

    let request = request.with_flags(CalcFlags {
        include_beta: true,
        ..CalcFlags::default()
    });
    assert!(service.calculate(&request).unwrap().get("tzais_rt").is_some());
}

#[test]
fn candle_lighting_over_a_week() {
    let file = lakewood_file();
    let service = file.service(EngineConfig::default()).unwrap();
    let request = RangeRequest::new(
        file.publisher_id(),
        file.locality_id(),
        date(2025, 12, 21),
        date(2025, 12, 27),
    )
    .with_zman_key("candle_lighting");
    let days = service.calculate_range(&request).unwrap();
    assert_eq!(days.len(), 7);
    let with_candles: Vec<_> = days.iter().filter(|d| !d.zmanim.is_empty()).map(|d| d.date).collect();
    assert_eq!(with_candles, [date(2025, 12, 26)]);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn text_and_json_output() {
    let file = lakewood_file();
    let service = file.service(EngineConfig::default()).unwrap();
    let day = service
        .calculate(&CalculationRequest::new(file.publisher_id(), file.locality_id(), date(2025, 12, 26)))
        .unwrap();

    let text = render_day(&day, OutputFormat::Text).unwrap();
    assert!(text.starts_with("Friday 2025-12-26"));
    assert!(text.contains("candle_lighting"));

    let json: serde_json::Value =
        serde_json::from_str(&render_day(&day, OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["date"], "2025-12-26");
    assert_eq!(json["zmanim"][0]["key"], "alos_hashachar");
    assert_eq!(json["zmanim"][0]["rounding"], "floor");

    let range = service
        .calculate_range(&RangeRequest::new(
            file.publisher_id(),
            file.locality_id(),
            date(2025, 12, 26),
            date(2025, 12, 27),
        ))
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&render_range(&range, OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
}

// =============================================================================
// Checking
// =============================================================================

#[test]
fn check_finds_unknown_names_and_cycles() {
    let mut file = lakewood_file();
    file.zmanim[0].formula = "solar(16.1, before_sunrize)".to_string();
    file.zmanim[10].formula = "@havdalah - 5min".to_string();

    let findings = file.check();
    assert!(
        findings
            .iter()
            .any(|(key, issue)| key == "alos_hashachar" && issue.kind == DiagnosticKind::UnknownIdentifier)
    );
    assert!(findings.iter().any(|(_, issue)| issue.kind == DiagnosticKind::Cycle));
}
