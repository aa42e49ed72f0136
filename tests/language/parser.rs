//! Integration tests for the parser and the parse cache

use std::sync::Arc;

use zmanim_foundation::ErrorKind;
use zmanim_language::{
    ExprKind, Function, MAX_DEPTH, ParseCache, Primitive, parse, parse_cached,
};

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn aliases_parse_to_canonical_primitives() {
    assert_eq!(parse("sunrise").unwrap().kind, parse("visible_sunrise").unwrap().kind);
    assert_eq!(
        parse("sunset").unwrap().kind,
        ExprKind::Primitive(Primitive::VisibleSunset)
    );
}

#[test]
fn printing_uses_canonical_names() {
    let expr = parse("first_valid(solar(16.1, before_sunrise), sunrise - 72min)").unwrap();
    assert_eq!(
        expr.to_string(),
        "first_valid(solar(16.1, before_visible_sunrise), visible_sunrise - 72min)"
    );
}

#[test]
fn printed_text_parses_back() {
    for source in [
        "proportional_hours(10.75, mga_16_1)",
        "midpoint(@alos, @tzeis)",
        r#"if (season == "winter" || latitude > 50) { civil_dawn } else { sunrise - 1h 12min }"#,
        "seasonal_solar(8.5, after_sunset) + 2min",
    ] {
        let printed = parse(source).unwrap().to_string();
        let reparsed = parse(&printed).unwrap().to_string();
        assert_eq!(printed, reparsed, "{source}");
    }
}

#[test]
fn calls_know_their_function() {
    let ExprKind::Call(function, args) = parse("later_of(sunrise, @misheyakir)").unwrap().kind else {
        panic!("expected call");
    };
    assert_eq!(function, Function::LaterOf);
    assert_eq!(args[1].kind, ExprKind::Reference("misheyakir".into()));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn syntax_errors_have_positions() {
    let err = parse("sunrise +").unwrap_err();
    assert!(err.is_parse_error());
    assert!(matches!(err.kind, ErrorKind::Syntax { line: 1, .. }));

    let err = parse("solar(16.1,\n  ").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
}

#[test]
fn unknown_words_are_named() {
    let err = parse("sunrise - tefillin").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownIdentifier { ref name, .. } if name == "tefillin"));
}

#[test]
fn trailing_input_is_rejected() {
    assert!(parse("sunrise sunset").is_err());
    assert!(parse("").is_err());
}

#[test]
fn nesting_is_bounded() {
    let ok = format!("{}sunrise{}", "(".repeat(MAX_DEPTH / 2), ")".repeat(MAX_DEPTH / 2));
    assert!(parse(&ok).is_ok());
    let deep = format!("{}sunrise{}", "(".repeat(MAX_DEPTH * 2), ")".repeat(MAX_DEPTH * 2));
    assert!(parse(&deep).is_err());
}

// =============================================================================
// Parse cache
// =============================================================================

#[test]
fn private_cache_shares_trees() {
    let cache = ParseCache::new();
    let a = cache.get_or_parse("sunset - 40min").unwrap();
    let b = cache.get_or_parse("sunset - 40min").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(cache.get_or_parse("sunset -").is_err());
    assert_eq!(cache.len(), 1);
}

#[test]
fn global_cache_returns_same_tree_across_threads() {
    let text = "proportional_hours(4, gra) + 0min";
    let here = parse_cached(text).unwrap();
    let there = std::thread::spawn(move || parse_cached(text).unwrap())
        .join()
        .unwrap();
    assert!(Arc::ptr_eq(&here, &there));
}
