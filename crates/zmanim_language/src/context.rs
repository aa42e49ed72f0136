//! Per-date evaluation state and reference resolution.
//!
//! One [`EvaluationContext`] is built for a (date, location) pair and shared
//! by every formula evaluated for that day. It memoizes each resolved key,
//! so a formula referenced many times is evaluated once, and it tracks the
//! keys currently being resolved so that a reference loop fails instead of
//! recursing forever.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use zmanim_astro::SolarCalculator;
use zmanim_foundation::{
    ActiveEvents, Diagnostic, DiagnosticKind, Error, ErrorKind, Location, Result, Value,
};

use crate::ast::{Expr, ExprKind};
use crate::eval;
use crate::parse_cache::parse_cached;

// =============================================================================
// Formula table
// =============================================================================

/// A publisher's formulas by key, already parsed.
///
/// Parse failures are kept so that a reference to a broken formula reports
/// why it is broken.
#[derive(Clone, Debug, Default)]
pub struct FormulaTable {
    entries: HashMap<String, Result<Arc<Expr>>>,
}

impl FormulaTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed (or failed) formula under `key`.
    pub fn insert(&mut self, key: impl Into<String>, parsed: Result<Arc<Expr>>) {
        self.entries.insert(key.into(), parsed);
    }

    /// Parses `text` through the parse cache and adds it under `key`.
    pub fn insert_text(&mut self, key: impl Into<String>, text: &str) {
        self.insert(key, parse_cached(text));
    }

    /// Builds a table from `(key, text)` pairs.
    pub fn from_texts<'a>(formulas: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self::new();
        for (key, text) in formulas {
            table.insert_text(key, text);
        }
        table
    }

    /// Returns the parse result for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Result<Arc<Expr>>> {
        self.entries.get(key)
    }

    /// Returns true if `key` is defined.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Defined keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of formulas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no formulas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Evaluation results
// =============================================================================

/// The outcome of evaluating one formula.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// The value, or the error that stopped evaluation.
    pub value: Result<Value>,
    /// Degradations noticed on the way (undefined references, unmatched conditions).
    pub warnings: Vec<Diagnostic>,
}

impl Evaluation {
    /// The instant, if evaluation produced one.
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.value.as_ref().ok().and_then(Value::as_instant)
    }

    /// Why this formula has no instant, if it has none.
    ///
    /// A null result reports the first warning recorded while computing it,
    /// or a plain no-event diagnostic.
    #[must_use]
    pub fn diagnostic(&self, key: &str) -> Option<Diagnostic> {
        match &self.value {
            Ok(Value::Instant(_)) => None,
            Ok(Value::Null) => Some(
                self.warnings
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Diagnostic::no_event(key)),
            ),
            Ok(other) => Some(Diagnostic::new(
                DiagnosticKind::Evaluation,
                format!("@{key} produced a {} instead of a time", other.value_type()),
            )),
            Err(err) => Some(Diagnostic::from(err)),
        }
    }
}

/// One step of a formula breakdown: a sub-expression and what it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownStep {
    /// Canonical text of the sub-expression.
    pub expression: String,
    /// Its value, with instants shown in the location's timezone.
    pub value: String,
}

#[derive(Clone, Debug)]
struct Memo {
    value: Result<Value>,
    warnings: Vec<Diagnostic>,
}

// =============================================================================
// Evaluation context
// =============================================================================

/// State for evaluating formulas on one date at one location.
///
/// Never reuse a context across dates: the memo holds that day's values.
pub struct EvaluationContext<'f> {
    date: NaiveDate,
    location: &'f Location,
    events: &'f ActiveEvents,
    formulas: &'f FormulaTable,
    solar: SolarCalculator,
    strict_references: bool,
    memo: HashMap<String, Memo>,
    /// Keys being resolved, outermost first.
    visiting: Vec<String>,
    /// Warning frames, one per key being resolved plus the top level.
    warnings: Vec<Vec<Diagnostic>>,
    breakdown: Option<Vec<BreakdownStep>>,
}

impl<'f> EvaluationContext<'f> {
    /// Creates a context for `date` at `location`.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        location: &'f Location,
        events: &'f ActiveEvents,
        formulas: &'f FormulaTable,
    ) -> Self {
        Self {
            date,
            location,
            events,
            formulas,
            solar: SolarCalculator::for_location(date, location),
            strict_references: false,
            memo: HashMap::new(),
            visiting: Vec::new(),
            warnings: Vec::new(),
            breakdown: None,
        }
    }

    /// Makes references to undefined keys errors instead of nulls.
    #[must_use]
    pub const fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// Records every primitive, function call and reference evaluated.
    #[must_use]
    pub fn with_breakdown(mut self) -> Self {
        self.breakdown = Some(Vec::new());
        self
    }

    /// The date being evaluated.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The location being evaluated.
    #[must_use]
    pub const fn location(&self) -> &Location {
        self.location
    }

    /// Calendar event codes active on this date.
    #[must_use]
    pub const fn active_events(&self) -> &ActiveEvents {
        self.events
    }

    /// Solar calculator for this date and location.
    #[must_use]
    pub const fn solar(&self) -> &SolarCalculator {
        &self.solar
    }

    /// Takes the breakdown recorded so far.
    pub fn take_breakdown(&mut self) -> Vec<BreakdownStep> {
        self.breakdown
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Evaluates the formula defined under `key`.
    ///
    /// Errors are that formula's own: a cycle through `key`, its parse error,
    /// or a failure of something it references.
    pub fn evaluate_key(&mut self, key: &str) -> Evaluation {
        self.warnings.push(Vec::new());
        let value = if self.formulas.contains(key) {
            self.resolve(key)
        } else {
            Err(Error::undefined_reference(key))
        };
        let warnings = self.warnings.pop().unwrap_or_default();
        Evaluation { value, warnings }
    }

    /// Evaluates an expression that is not part of the formula table.
    pub fn evaluate(&mut self, expr: &Expr) -> Evaluation {
        self.warnings.push(Vec::new());
        let value = eval::evaluate(self, expr);
        let warnings = self.warnings.pop().unwrap_or_default();
        Evaluation { value, warnings }
    }

    /// Resolves `@key` from inside another formula.
    pub(crate) fn reference(&mut self, key: &str) -> Result<Value> {
        if let Some(start) = self.visiting.iter().position(|k| k == key) {
            let mut path = self.visiting[start..].to_vec();
            path.push(key.to_string());
            return Err(Error::cycle(path));
        }
        if !self.formulas.contains(key) {
            return self.missing_reference(key);
        }
        self.resolve(key).map_err(|err| self.wrap_dependency(key, err))
    }

    /// Memoized evaluation of a defined key. Errors are the key's own.
    fn resolve(&mut self, key: &str) -> Result<Value> {
        if let Some(memo) = self.memo.get(key) {
            let value = memo.value.clone();
            let warnings = memo.warnings.clone();
            self.extend_warnings(warnings);
            return value;
        }

        let formulas = self.formulas;
        let parsed = match formulas.get(key) {
            Some(Ok(expr)) => Ok(Arc::clone(expr)),
            Some(Err(err)) => Err(err.clone()),
            None => Err(Error::undefined_reference(key)),
        };

        self.visiting.push(key.to_string());
        self.warnings.push(Vec::new());
        let value = parsed.and_then(|expr| eval::evaluate(self, &expr));
        let warnings = self.warnings.pop().unwrap_or_default();
        self.visiting.pop();

        self.memo.insert(
            key.to_string(),
            Memo {
                value: value.clone(),
                warnings: warnings.clone(),
            },
        );
        self.extend_warnings(warnings);
        value
    }

    fn missing_reference(&mut self, key: &str) -> Result<Value> {
        if self.strict_references {
            return Err(Error::undefined_reference(key));
        }
        tracing::debug!(key, "undefined reference evaluates to null");
        self.warn(Diagnostic::new(
            DiagnosticKind::UndefinedReference,
            format!("undefined reference: @{key}"),
        ));
        Ok(Value::Null)
    }

    /// A referenced key's failure, as seen by the formula referencing it.
    ///
    /// A cycle that passes through the current formula is its own failure and
    /// stays a cycle; anything else becomes a dependency failure.
    fn wrap_dependency(&self, key: &str, err: Error) -> Error {
        match &err.kind {
            ErrorKind::Cycle(path)
                if self
                    .visiting
                    .last()
                    .is_some_and(|current| path.contains(current)) =>
            {
                err
            }
            _ => Error::dependency_failed(key, &err),
        }
    }

    /// Records a degradation against the formula being evaluated.
    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        if let Some(frame) = self.warnings.last_mut() {
            frame.push(diagnostic);
        }
    }

    fn extend_warnings(&mut self, warnings: Vec<Diagnostic>) {
        if let Some(frame) = self.warnings.last_mut() {
            frame.extend(warnings);
        }
    }

    /// Adds a breakdown step if a breakdown is being recorded.
    pub(crate) fn record(&mut self, expr: &Expr, value: &Result<Value>) {
        if self.breakdown.is_none()
            || !matches!(
                expr.kind,
                ExprKind::Primitive(_) | ExprKind::Call(..) | ExprKind::Reference(_)
            )
        {
            return;
        }
        let shown = match value {
            Ok(Value::Instant(t)) => t
                .with_timezone(&self.location.timezone)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string(),
            Ok(other) => other.to_string(),
            Err(err) => format!("error: {err}"),
        };
        let step = BreakdownStep {
            expression: expr.to_string(),
            value: shown,
        };
        if let Some(steps) = self.breakdown.as_mut() {
            steps.push(step);
        }
    }
}
