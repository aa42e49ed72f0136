//! Built-in formula functions.
//!
//! Arity is checked by the parser; this module checks argument types and
//! ranges. Missing astronomical events come back as [`Value::Null`].

use chrono::{DateTime, TimeDelta, Utc};
use zmanim_astro::{SolarCalculator, proportional_minutes, proportional_time};
use zmanim_foundation::{Error, Result, Value, ValueType, minutes_to_delta, scale_delta};

use crate::ast::{Base, Direction, Expr, ExprKind, Function};
use crate::context::EvaluationContext;
use crate::eval::evaluate;

/// Largest depression angle `solar` accepts.
pub const MAX_DEGREES: f64 = 90.0;

/// Minutes in a proportional day (twelve proportional hours).
const PROPORTIONAL_DAY_MINUTES: f64 = 720.0;

/// Evaluates a call to `function` with unevaluated `args`.
///
/// # Errors
/// Returns an error if an argument has the wrong type or is out of range.
pub fn call(ctx: &mut EvaluationContext<'_>, function: Function, args: &[Expr]) -> Result<Value> {
    match function {
        Function::Solar => solar(ctx, args),
        Function::SeasonalSolar => seasonal_solar(ctx, args),
        Function::ProportionalHours => proportional_hours(ctx, args),
        Function::ProportionalMinutes => proportional_minutes_fn(ctx, args),
        Function::Midpoint => midpoint(ctx, args),
        Function::FirstValid => first_valid(ctx, args),
        Function::EarlierOf => extreme(ctx, args, Extreme::Earlier),
        Function::LaterOf => extreme(ctx, args, Extreme::Later),
    }
}

// =============================================================================
// Argument helpers
// =============================================================================

fn arg(args: &[Expr], index: usize, function: Function) -> Result<&Expr> {
    args.get(index).ok_or_else(|| {
        Error::arity_mismatch(function.name(), function.arity().to_string(), args.len())
    })
}

/// Evaluates a numeric argument. `None` means the argument is null.
fn number_arg(
    ctx: &mut EvaluationContext<'_>,
    args: &[Expr],
    index: usize,
    function: Function,
) -> Result<Option<f64>> {
    match evaluate(ctx, arg(args, index, function)?)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(n)),
        other => Err(Error::type_mismatch(
            format!("number as argument {} of {}", index + 1, function.name()),
            other.value_type(),
        )),
    }
}

/// Evaluates an instant argument. `None` means the argument is null.
fn instant_arg(
    ctx: &mut EvaluationContext<'_>,
    expr: &Expr,
    function: Function,
) -> Result<Option<DateTime<Utc>>> {
    match evaluate(ctx, expr)? {
        Value::Null => Ok(None),
        Value::Instant(t) => Ok(Some(t)),
        other => Err(Error::type_mismatch(
            format!("time as argument of {}", function.name()),
            other.value_type(),
        )),
    }
}

/// Reads a direction argument, or the default when it is absent.
fn direction_arg(
    ctx: &mut EvaluationContext<'_>,
    args: &[Expr],
    index: usize,
    function: Function,
    default: Option<Direction>,
) -> Result<Direction> {
    let Some(expr) = args.get(index) else {
        return default.ok_or_else(|| {
            Error::arity_mismatch(function.name(), function.arity().to_string(), args.len())
        });
    };
    if let ExprKind::Direction(direction) = expr.kind {
        return Ok(direction);
    }
    let value = evaluate(ctx, expr)?;
    Err(Error::type_mismatch(
        format!("direction as argument {} of {}", index + 1, function.name()),
        value.value_type(),
    ))
}

fn degrees_arg(
    ctx: &mut EvaluationContext<'_>,
    args: &[Expr],
    function: Function,
) -> Result<Option<f64>> {
    let Some(degrees) = number_arg(ctx, args, 0, function)? else {
        return Ok(None);
    };
    if !(0.0..=MAX_DEGREES).contains(&degrees) {
        return Err(Error::invalid_argument(format!(
            "{}: {degrees} degrees is outside 0..={MAX_DEGREES}",
            function.name()
        )));
    }
    Ok(Some(degrees))
}

// =============================================================================
// Solar angles
// =============================================================================

fn solar(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    let function = Function::Solar;
    let Some(degrees) = degrees_arg(ctx, args, function)? else {
        return Ok(Value::Null);
    };
    let direction = direction_arg(ctx, args, 1, function, Some(Direction::BeforeVisibleSunrise))?;
    let event = if direction.is_morning() {
        ctx.solar().dawn(degrees)
    } else {
        ctx.solar().dusk(degrees)
    };
    Ok(Value::from(event.instant()))
}

fn seasonal_solar(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    let function = Function::SeasonalSolar;
    let Some(degrees) = degrees_arg(ctx, args, function)? else {
        return Ok(Value::Null);
    };
    let direction = direction_arg(ctx, args, 1, function, Some(Direction::BeforeVisibleSunrise))?;
    require_outward(function, direction)?;
    let instant = if direction.is_morning() {
        ctx.solar().seasonal_dawn(degrees)
    } else {
        ctx.solar().seasonal_dusk(degrees)
    };
    Ok(Value::from(instant))
}

fn require_outward(function: Function, direction: Direction) -> Result<()> {
    if direction.is_outward() {
        return Ok(());
    }
    Err(Error::invalid_argument(format!(
        "{} does not accept {}; use before_visible_sunrise, after_visible_sunset, \
         before_geometric_sunrise or after_geometric_sunset",
        function.name(),
        direction.name()
    )))
}

// =============================================================================
// Proportional time
// =============================================================================

fn proportional_hours(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    let function = Function::ProportionalHours;
    let Some(hours) = number_arg(ctx, args, 0, function)? else {
        return Ok(Value::Null);
    };
    let base = arg(args, 1, function)?;
    let Some((start, end)) = day_bounds(ctx, base)? else {
        return Ok(Value::Null);
    };
    if end <= start {
        return Ok(Value::Null);
    }
    proportional_time(start, end, hours)
        .map(Value::Instant)
        .ok_or_else(|| Error::invalid_argument(format!("{hours} proportional hours is out of range")))
}

/// Start and end of the day a base defines, or `None` when either end does
/// not occur.
fn day_bounds(
    ctx: &mut EvaluationContext<'_>,
    base: &Expr,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    match &base.kind {
        ExprKind::Base(named) => Ok(named_bounds(ctx.solar(), *named)),
        ExprKind::CustomBase { start, end } => {
            let function = Function::ProportionalHours;
            let start = instant_arg(ctx, start, function)?;
            let end = instant_arg(ctx, end, function)?;
            Ok(start.zip(end))
        }
        _ => {
            let value = evaluate(ctx, base)?;
            Err(Error::type_mismatch(
                "day base as argument 2 of proportional_hours",
                value.value_type(),
            ))
        }
    }
}

fn named_bounds(solar: &SolarCalculator, base: Base) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let sunrise = solar.sunrise().instant();
    let sunset = solar.sunset().instant();
    match base {
        Base::Gra => sunrise.zip(sunset),
        Base::MgaMinutes(minutes) => {
            let offset = minutes_to_delta(f64::from(minutes));
            Some((sunrise? - offset, sunset? + offset))
        }
        Base::MgaZmanis(minutes) => {
            let (sunrise, sunset) = (sunrise?, sunset?);
            let offset = proportional_minutes(sunset - sunrise, f64::from(minutes));
            Some((sunrise - offset, sunset + offset))
        }
        Base::MgaDegrees(_) | Base::BaalHatanya => {
            let degrees = base.degrees()?;
            solar.dawn(degrees).instant().zip(solar.dusk(degrees).instant())
        }
        Base::AteretTorah => Some((sunrise?, sunset? + TimeDelta::minutes(40))),
    }
}

fn proportional_minutes_fn(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    let function = Function::ProportionalMinutes;
    let Some(minutes) = number_arg(ctx, args, 0, function)? else {
        return Ok(Value::Null);
    };
    let direction = direction_arg(ctx, args, 1, function, None)?;
    require_outward(function, direction)?;

    let solar = ctx.solar();
    let (sunrise, sunset) = match direction {
        Direction::BeforeGeometricSunrise | Direction::AfterGeometricSunset => {
            (solar.geometric_sunrise(), solar.geometric_sunset())
        }
        _ => (solar.sunrise(), solar.sunset()),
    };
    let (Some(sunrise), Some(sunset)) = (sunrise.instant(), sunset.instant()) else {
        return Ok(Value::Null);
    };
    let day = sunset - sunrise;
    if day <= TimeDelta::zero() {
        return Ok(Value::Null);
    }
    let offset = scale_delta(day, minutes / PROPORTIONAL_DAY_MINUTES);
    let instant = if direction.is_morning() {
        sunrise.checked_sub_signed(offset)
    } else {
        sunset.checked_add_signed(offset)
    };
    instant.map(Value::Instant).ok_or_else(|| {
        Error::invalid_argument(format!("{minutes} proportional minutes is out of range"))
    })
}

// =============================================================================
// Combinators
// =============================================================================

fn midpoint(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    let function = Function::Midpoint;
    let a = instant_arg(ctx, arg(args, 0, function)?, function)?;
    let b = instant_arg(ctx, arg(args, 1, function)?, function)?;
    Ok(Value::from(
        a.zip(b).map(|(a, b)| zmanim_astro::midpoint(a, b)),
    ))
}

/// The first argument that produces a value. Null results and recoverable
/// errors move on to the next argument; other errors stop the search.
fn first_valid(ctx: &mut EvaluationContext<'_>, args: &[Expr]) -> Result<Value> {
    for expr in args {
        match evaluate(ctx, expr) {
            Ok(Value::Null) => {}
            Ok(value) => return Ok(value),
            Err(err) if err.is_recoverable() => {
                tracing::trace!(%err, "first_valid skipping failed alternative");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(Value::Null)
}

#[derive(Copy, Clone)]
enum Extreme {
    Earlier,
    Later,
}

/// `earlier_of` / `later_of`. A null side is ignored.
fn extreme(ctx: &mut EvaluationContext<'_>, args: &[Expr], which: Extreme) -> Result<Value> {
    let function = match which {
        Extreme::Earlier => Function::EarlierOf,
        Extreme::Later => Function::LaterOf,
    };
    let a = instant_arg(ctx, arg(args, 0, function)?, function)?;
    let b = instant_arg(ctx, arg(args, 1, function)?, function)?;
    let picked = match (a, b) {
        (Some(a), Some(b)) => Some(match which {
            Extreme::Earlier => a.min(b),
            Extreme::Later => a.max(b),
        }),
        (one, None) | (None, one) => one,
    };
    Ok(Value::from(picked))
}

/// The value type a bare argument node would produce, used in messages.
#[must_use]
pub fn argument_type(expr: &Expr) -> Option<ValueType> {
    match expr.kind {
        ExprKind::Direction(_) => Some(ValueType::Direction),
        ExprKind::Base(_) | ExprKind::CustomBase { .. } => Some(ValueType::Base),
        ExprKind::Number(_) => Some(ValueType::Number),
        ExprKind::Duration(_) => Some(ValueType::Duration),
        ExprKind::Text(_) => Some(ValueType::Text),
        ExprKind::Bool(_) => Some(ValueType::Bool),
        ExprKind::Primitive(_) => Some(ValueType::Instant),
        _ => None,
    }
}
