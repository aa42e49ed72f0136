//! Tree-walking evaluator.
//!
//! Evaluation is depth-first. Null (no event) propagates through arithmetic
//! and comparisons; a null condition makes the whole conditional null.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use zmanim_foundation::{
    Diagnostic, DiagnosticKind, Error, ErrorKind, Result, Value, ValueType, minutes_to_delta, scale_delta,
};

use crate::ast::{BinaryOp, ConditionVar, Expr, ExprKind, Primitive};
use crate::context::EvaluationContext;
use crate::functions;

/// Evaluates `expr` in `ctx`.
///
/// # Errors
/// Returns an error for type mismatches, invalid arguments, division by zero
/// and failed references.
pub fn evaluate(ctx: &mut EvaluationContext<'_>, expr: &Expr) -> Result<Value> {
    let value = match &expr.kind {
        ExprKind::Primitive(p) => Ok(primitive(ctx, *p)),
        ExprKind::Call(function, args) => functions::call(ctx, *function, args),
        ExprKind::Reference(key) => ctx.reference(key),
        ExprKind::Offset { base, minutes } => {
            evaluate(ctx, base).and_then(|v| offset(v, *minutes))
        }
        ExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => conditional(ctx, condition, then_branch, else_branch.as_deref()),
        ExprKind::Binary { op, left, right } => binary(ctx, *op, left, right),
        ExprKind::Not(inner) => evaluate(ctx, inner).and_then(not),
        ExprKind::Negate(inner) => evaluate(ctx, inner).and_then(negate),
        ExprKind::Number(n) => Ok(Value::Number(*n)),
        ExprKind::Duration(m) => Ok(Value::minutes(*m)),
        ExprKind::Condition(var) => Ok(condition_variable(ctx, *var)),
        ExprKind::Direction(_) => Err(Error::type_mismatch("a value", ValueType::Direction)),
        ExprKind::Base(_) | ExprKind::CustomBase { .. } => {
            Err(Error::type_mismatch("a value", ValueType::Base))
        }
        ExprKind::Date { day, month } => date_literal(ctx.date(), *day, *month),
        ExprKind::Text(s) => Ok(Value::text(s)),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
    };
    ctx.record(expr, &value);
    value
}

// =============================================================================
// Leaves
// =============================================================================

fn primitive(ctx: &EvaluationContext<'_>, primitive: Primitive) -> Value {
    let solar = ctx.solar();
    let event = match primitive {
        Primitive::VisibleSunrise => solar.sunrise(),
        Primitive::VisibleSunset => solar.sunset(),
        Primitive::GeometricSunrise => solar.geometric_sunrise(),
        Primitive::GeometricSunset => solar.geometric_sunset(),
        Primitive::SolarNoon => return Value::Instant(solar.solar_noon()),
        Primitive::SolarMidnight => return Value::Instant(solar.solar_midnight()),
        Primitive::CivilDawn => solar.civil_dawn(),
        Primitive::CivilDusk => solar.civil_dusk(),
        Primitive::NauticalDawn => solar.nautical_dawn(),
        Primitive::NauticalDusk => solar.nautical_dusk(),
        Primitive::AstronomicalDawn => solar.astronomical_dawn(),
        Primitive::AstronomicalDusk => solar.astronomical_dusk(),
    };
    Value::from(event.instant())
}

fn condition_variable(ctx: &EvaluationContext<'_>, var: ConditionVar) -> Value {
    let date = ctx.date();
    let location = ctx.location();
    match var {
        ConditionVar::Latitude => Value::Number(location.latitude),
        ConditionVar::Longitude => Value::Number(location.longitude),
        ConditionVar::Elevation => Value::Number(location.elevation),
        ConditionVar::DayLength => ctx.solar().day_length().map_or(Value::Null, Value::Duration),
        ConditionVar::Month => Value::Number(f64::from(date.month())),
        ConditionVar::Day => Value::Number(f64::from(date.day())),
        ConditionVar::DayOfYear | ConditionVar::Date => Value::Number(f64::from(date.ordinal())),
        ConditionVar::Season => Value::text(season(date.month(), location.is_southern())),
    }
}

/// Meteorological season for a month, flipped south of the equator.
#[must_use]
pub fn season(month: u32, southern: bool) -> &'static str {
    let northern = match month {
        3..=5 => "spring",
        6..=8 => "summer",
        9..=11 => "autumn",
        _ => "winter",
    };
    if !southern {
        return northern;
    }
    match northern {
        "spring" => "autumn",
        "summer" => "winter",
        "autumn" => "spring",
        _ => "summer",
    }
}

/// A `21-May` literal as a day of year in the evaluation year.
fn date_literal(today: NaiveDate, day: u32, month: u32) -> Result<Value> {
    NaiveDate::from_ymd_opt(today.year(), month, day)
        .map(|d| Value::Number(f64::from(d.ordinal())))
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "{day}/{month} does not exist in {}",
                today.year()
            ))
        })
}

// =============================================================================
// Composite nodes
// =============================================================================

fn offset(base: Value, minutes: f64) -> Result<Value> {
    let delta = minutes_to_delta(minutes);
    match base {
        Value::Null => Ok(Value::Null),
        Value::Instant(t) => shift(t, delta).map(Value::Instant),
        Value::Duration(d) => add_durations(d, delta).map(Value::Duration),
        other => Err(Error::type_mismatch("time or duration", other.value_type())),
    }
}

fn conditional(
    ctx: &mut EvaluationContext<'_>,
    condition: &Expr,
    then_branch: &Expr,
    else_branch: Option<&Expr>,
) -> Result<Value> {
    match evaluate(ctx, condition)? {
        Value::Null => Ok(Value::Null),
        Value::Bool(true) => evaluate(ctx, then_branch),
        Value::Bool(false) => match else_branch {
            Some(e) => evaluate(ctx, e),
            None => {
                ctx.warn(Diagnostic::new(
                    DiagnosticKind::Domain,
                    format!("condition ({condition}) is false and there is no else branch"),
                ));
                Ok(Value::Null)
            }
        },
        other => Err(Error::type_mismatch("boolean condition", other.value_type())),
    }
}

fn not(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(Error::type_mismatch("boolean", other.value_type())),
    }
}

fn negate(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::Duration(d) => Ok(Value::Duration(-d)),
        other => Err(Error::type_mismatch("number or duration", other.value_type())),
    }
}

fn binary(ctx: &mut EvaluationContext<'_>, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
    match op {
        BinaryOp::And | BinaryOp::Or => logical(ctx, op, left, right),
        _ => {
            let l = evaluate(ctx, left)?;
            let r = evaluate(ctx, right)?;
            if op.is_comparison() {
                compare(op, &l, &r)
            } else {
                arithmetic(op, l, r)
            }
        }
    }
}

/// Short-circuiting `&&` and `||`.
fn logical(ctx: &mut EvaluationContext<'_>, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
    let decisive = op == BinaryOp::Or;
    match evaluate(ctx, left)? {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) if b == decisive => Ok(Value::Bool(b)),
        Value::Bool(_) => match evaluate(ctx, right)? {
            v @ (Value::Null | Value::Bool(_)) => Ok(v),
            other => Err(Error::type_mismatch("boolean", other.value_type())),
        },
        other => Err(Error::type_mismatch("boolean", other.value_type())),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Instant(a), Value::Instant(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
            Some(a.cmp(b))
        }
        _ => {
            return Err(Error::type_mismatch(
                format!("{} to compare with '{}'", left.value_type(), op.symbol()),
                right.value_type(),
            ));
        }
    };
    // NaN compares false every way except !=.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(op == BinaryOp::Ne));
    };
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return Err(Error::new(ErrorKind::Internal(format!(
            "'{}' is not a comparison",
            op.symbol()
        )))),
    };
    Ok(Value::Bool(result))
}

/// `+ - * /` over the value types.
///
/// # Errors
/// Returns a type mismatch for unsupported operand pairs and
/// [`zmanim_foundation::ErrorKind::DivisionByZero`] for a zero divisor.
pub fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use Value::{Duration, Instant, Null, Number};

    match (op, left, right) {
        (_, Null, _) | (_, _, Null) => Ok(Null),

        (BinaryOp::Add, Instant(t), Duration(d)) | (BinaryOp::Add, Duration(d), Instant(t)) => {
            shift(t, d).map(Instant)
        }
        (BinaryOp::Sub, Instant(t), Duration(d)) => shift(t, -d).map(Instant),
        (BinaryOp::Sub, Instant(a), Instant(b)) => Ok(Duration(a - b)),

        (BinaryOp::Add, Duration(a), Duration(b)) => add_durations(a, b).map(Duration),
        (BinaryOp::Sub, Duration(a), Duration(b)) => add_durations(a, -b).map(Duration),
        (BinaryOp::Mul, Duration(d), Number(n)) | (BinaryOp::Mul, Number(n), Duration(d)) => {
            Ok(Duration(scale_delta(d, n)))
        }
        (BinaryOp::Div, Duration(d), Number(n)) => {
            if n == 0.0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                Ok(Duration(scale_delta(d, 1.0 / n)))
            }
        }
        (BinaryOp::Div, Duration(a), Duration(b)) => {
            if b.is_zero() {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                #[allow(clippy::cast_precision_loss)]
                let ratio = a.num_milliseconds() as f64 / b.num_milliseconds() as f64;
                Ok(Number(ratio))
            }
        }

        (BinaryOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinaryOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinaryOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinaryOp::Div, Number(a), Number(b)) => {
            if b == 0.0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                Ok(Number(a / b))
            }
        }

        (op, left, right) => Err(Error::type_mismatch(
            format!("operand for {} {}", left.value_type(), op.symbol()),
            right.value_type(),
        )),
    }
}

fn shift(t: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>> {
    t.checked_add_signed(delta)
        .ok_or_else(|| Error::invalid_argument("time offset out of range"))
}

fn add_durations(a: TimeDelta, b: TimeDelta) -> Result<TimeDelta> {
    a.checked_add(&b)
        .ok_or_else(|| Error::invalid_argument("duration out of range"))
}
