//! Static checks and dependency analysis for formula sets.
//!
//! Validation runs without a date or location. It reports every problem it
//! finds instead of stopping at the first, so an editor can show them all.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use zmanim_foundation::{Diagnostic, DiagnosticKind, Error, Result, ValueType};

use crate::ast::{Direction, Expr, ExprKind, Function};
use crate::functions::{MAX_DEGREES, argument_type};
use crate::parser::parse;
use crate::span::Span;

/// One problem found in a formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Category of the problem.
    pub kind: DiagnosticKind,
    /// Human-readable explanation.
    pub message: String,
    /// Where in the formula text, when known.
    pub span: Option<Span>,
}

impl ValidationIssue {
    fn at(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }
}

impl From<&Error> for ValidationIssue {
    fn from(err: &Error) -> Self {
        let diagnostic = Diagnostic::from(err);
        Self {
            kind: diagnostic.kind,
            message: diagnostic.message,
            span: None,
        }
    }
}

impl From<ValidationIssue> for Diagnostic {
    fn from(issue: ValidationIssue) -> Self {
        Self::new(issue.kind, issue.message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{span}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Checks `text` as the formula for `own_key` within a set defining `available_keys`.
///
/// Returns an empty list when the formula is valid.
pub fn validate_formula<S: AsRef<str>>(
    text: &str,
    own_key: Option<&str>,
    available_keys: &[S],
) -> Vec<ValidationIssue> {
    let expr = match parse(text) {
        Ok(expr) => expr,
        Err(err) => return vec![ValidationIssue::from(&err)],
    };
    let mut checker = Checker {
        own_key,
        available: available_keys.iter().map(AsRef::as_ref).collect(),
        issues: Vec::new(),
    };
    checker.check(&expr, Slot::Value);
    checker.issues
}

/// What an expression position expects.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Slot {
    Value,
    Direction(Function),
    Base,
}

struct Checker<'a> {
    own_key: Option<&'a str>,
    available: BTreeSet<&'a str>,
    issues: Vec<ValidationIssue>,
}

impl Checker<'_> {
    fn issue(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.issues.push(ValidationIssue::at(kind, message, span));
    }

    fn check(&mut self, expr: &Expr, slot: Slot) {
        match (&expr.kind, slot) {
            (ExprKind::Direction(direction), Slot::Direction(function)) => {
                if !accepts_direction(function, *direction) {
                    self.issue(
                        DiagnosticKind::Evaluation,
                        format!(
                            "{} does not accept {}; use before_visible_sunrise, \
                             after_visible_sunset, before_geometric_sunrise or after_geometric_sunset",
                            function.name(),
                            direction.name()
                        ),
                        expr.span,
                    );
                }
            }
            (ExprKind::Base(_), Slot::Base) => {}
            (ExprKind::CustomBase { start, end }, Slot::Base) => {
                for bound in [start, end] {
                    self.expect_time(bound, "custom");
                    self.check(bound, Slot::Value);
                }
            }
            (ExprKind::Direction(direction), _) => self.issue(
                DiagnosticKind::Evaluation,
                format!(
                    "direction {} can only be used as a function argument",
                    direction.name()
                ),
                expr.span,
            ),
            (ExprKind::Base(_) | ExprKind::CustomBase { .. }, _) => self.issue(
                DiagnosticKind::Evaluation,
                format!("day base {expr} can only be used in proportional_hours"),
                expr.span,
            ),
            (_, Slot::Direction(_)) => self.issue(
                DiagnosticKind::Evaluation,
                format!("expected a direction, found {expr}"),
                expr.span,
            ),
            (_, Slot::Base) => self.issue(
                DiagnosticKind::Evaluation,
                format!("expected a day base (gra, mga, custom(...)), found {expr}"),
                expr.span,
            ),
            (ExprKind::Call(function, args), Slot::Value) => self.check_call(*function, args),
            (ExprKind::Reference(key), Slot::Value) => self.check_reference(key, expr.span),
            (_, Slot::Value) => {
                for child in expr.children() {
                    self.check(child, Slot::Value);
                }
            }
        }
    }

    fn check_call(&mut self, function: Function, args: &[Expr]) {
        for (index, arg) in args.iter().enumerate() {
            let slot = match (function, index) {
                (Function::Solar | Function::SeasonalSolar | Function::ProportionalMinutes, 1) => {
                    Slot::Direction(function)
                }
                (Function::ProportionalHours, 1) => Slot::Base,
                _ => Slot::Value,
            };
            if slot == Slot::Value {
                self.check_value_arg(function, index, arg);
            }
            self.check(arg, slot);
        }
    }

    fn check_value_arg(&mut self, function: Function, index: usize, arg: &Expr) {
        match (function, index) {
            (Function::Solar | Function::SeasonalSolar, 0) => {
                if let ExprKind::Number(degrees) = arg.kind {
                    if !(0.0..=MAX_DEGREES).contains(&degrees) {
                        self.issue(
                            DiagnosticKind::Evaluation,
                            format!(
                                "{}: {degrees} degrees is outside 0..={MAX_DEGREES}",
                                function.name()
                            ),
                            arg.span,
                        );
                    }
                }
            }
            (Function::Midpoint | Function::EarlierOf | Function::LaterOf, _) => {
                self.expect_time(arg, function.name());
            }
            _ => {}
        }
    }

    /// Flags literal arguments that can never produce a time.
    fn expect_time(&mut self, arg: &Expr, function: &str) {
        let Some(found) = argument_type(arg) else {
            return;
        };
        if matches!(found, ValueType::Instant | ValueType::Direction | ValueType::Base) {
            return;
        }
        self.issue(
            DiagnosticKind::Evaluation,
            format!("{function} expects a time, found a {found}"),
            arg.span,
        );
    }

    fn check_reference(&mut self, key: &str, span: Span) {
        if self.own_key == Some(key) {
            self.issue(
                DiagnosticKind::Cycle,
                format!("@{key} references itself"),
                span,
            );
        } else if !self.available.contains(key) {
            self.issue(
                DiagnosticKind::UndefinedReference,
                format!("undefined reference: @{key}"),
                span,
            );
        }
    }
}

// =============================================================================
// Dependency analysis
// =============================================================================

/// Every key referenced with `@key` in `expr`.
#[must_use]
pub fn references(expr: &Expr) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    expr.walk(&mut |node| {
        if let ExprKind::Reference(key) = &node.kind {
            keys.insert(key.clone());
        }
    });
    keys
}

/// Orders formulas so each comes after every formula it references.
///
/// References to keys outside the set are ignored. Independent keys are
/// ordered by name.
///
/// # Errors
/// Returns a [`zmanim_foundation::ErrorKind::Cycle`] naming the first cycle found.
pub fn calculation_order<'a>(
    formulas: impl IntoIterator<Item = (&'a str, &'a Expr)>,
) -> Result<Vec<String>> {
    let graph: BTreeMap<&str, BTreeSet<String>> = formulas
        .into_iter()
        .map(|(key, expr)| (key, references(expr)))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    let mut done = BTreeSet::new();
    let mut path = Vec::new();
    for key in graph.keys() {
        visit(*key, &graph, &mut done, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit<'g>(
    key: &'g str,
    graph: &'g BTreeMap<&'g str, BTreeSet<String>>,
    done: &mut BTreeSet<&'g str>,
    path: &mut Vec<&'g str>,
    order: &mut Vec<String>,
) -> Result<()> {
    if done.contains(key) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|k| *k == key) {
        let mut cycle: Vec<String> = path[start..].iter().map(|k| (*k).to_string()).collect();
        cycle.push(key.to_string());
        return Err(Error::cycle(cycle));
    }
    let Some(deps) = graph.get(key) else {
        return Ok(());
    };
    path.push(key);
    for dep in deps {
        if let Some((dep_key, _)) = graph.get_key_value(dep.as_str()) {
            visit(*dep_key, graph, done, path, order)?;
        }
    }
    path.pop();
    done.insert(key);
    order.push(key.to_string());
    Ok(())
}

/// Returns true if `direction` may be passed to `function`.
#[must_use]
pub fn accepts_direction(function: Function, direction: Direction) -> bool {
    match function {
        Function::Solar => true,
        Function::SeasonalSolar | Function::ProportionalMinutes => direction.is_outward(),
        _ => false,
    }
}
