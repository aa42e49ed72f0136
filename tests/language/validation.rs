//! Integration tests for static validation and dependency ordering

use zmanim_foundation::{DiagnosticKind, ErrorKind};
use zmanim_language::{calculation_order, parse, references, validate_formula};

const KEYS: [&str; 4] = ["alos", "sunrise_key", "tzeis", "chatzos"];

#[test]
fn realistic_formulas_validate() {
    for text in [
        "solar(16.1, before_sunrise)",
        "proportional_hours(3, custom(@alos, @tzeis))",
        "if (latitude > 50 && season == \"summer\") { civil_dawn } else { @alos }",
        "midpoint(@chatzos, solar_midnight + 24h)",
        "first_valid(seasonal_solar(16.1, before_sunrise), sunrise - 72min)",
    ] {
        let issues = validate_formula(text, Some("new_key"), &KEYS);
        assert!(issues.is_empty(), "{text}: {issues:?}");
    }
}

#[test]
fn issues_carry_kind_and_span() {
    let issues = validate_formula("sunrise + moonrise", None, &KEYS);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, DiagnosticKind::UnknownIdentifier);
    assert_eq!(issues[0].span.map(|s| s.column), Some(11));
    assert!(issues[0].to_string().contains("moonrise"));
}

#[test]
fn undefined_and_self_references() {
    let issues = validate_formula("later_of(@tzeis_72, @mine)", Some("mine"), &KEYS);
    let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::UndefinedReference));
    assert!(kinds.contains(&DiagnosticKind::Cycle));
}

#[test]
fn no_own_key_means_no_self_cycle_check() {
    let issues = validate_formula("@alos + 5min", None, &KEYS);
    assert!(issues.is_empty());
}

#[test]
fn references_are_collected_once() {
    let expr = parse("earlier_of(@a, @a + 5min)").unwrap();
    assert_eq!(references(&expr).len(), 1);
}

#[test]
fn order_puts_dependencies_first() {
    let alos = parse("solar(16.1)").unwrap();
    let misheyakir = parse("@alos + 10min").unwrap();
    let shma = parse("proportional_hours(3, custom(@alos, @tzeis))").unwrap();
    let tzeis = parse("solar(8.5, after_sunset)").unwrap();
    let order = calculation_order([
        ("shma", &shma),
        ("misheyakir", &misheyakir),
        ("tzeis", &tzeis),
        ("alos", &alos),
    ])
    .unwrap();
    let position = |key: &str| order.iter().position(|k| k == key).unwrap();
    assert!(position("alos") < position("misheyakir"));
    assert!(position("alos") < position("shma"));
    assert!(position("tzeis") < position("shma"));
    assert_eq!(order.len(), 4);
}

#[test]
fn order_detects_long_cycles() {
    let a = parse("@b").unwrap();
    let b = parse("@c + 1min").unwrap();
    let c = parse("earlier_of(@a, sunrise)").unwrap();
    let err = calculation_order([("a", &a), ("b", &b), ("c", &c)]).unwrap_err();
    let ErrorKind::Cycle(path) = err.kind else {
        panic!("expected cycle, got {err}");
    };
    assert_eq!(path.len(), 4);
    assert_eq!(path.first(), path.last());
}
