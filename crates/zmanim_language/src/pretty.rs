//! Canonical formula text for expressions.
//!
//! Printing uses canonical names (`visible_sunrise`, not `sunrise`) and
//! parenthesizes nested operators, so printed text always parses back to
//! the same tree shape.

use std::fmt;

use crate::ast::{Expr, ExprKind};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Primitive(p) => f.write_str(p.name()),
            ExprKind::Call(function, args) => {
                write!(f, "{}(", function.name())?;
                write_list(f, args.iter())?;
                f.write_str(")")
            }
            ExprKind::Reference(key) => write!(f, "@{key}"),
            ExprKind::Offset { base, minutes } => {
                write_operand(f, base)?;
                let sign = if *minutes < 0.0 { '-' } else { '+' };
                write!(f, " {sign} {}min", minutes.abs())
            }
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({condition}) {{ {then_branch} }}")?;
                match else_branch {
                    Some(e) if matches!(e.kind, ExprKind::Conditional { .. }) => {
                        write!(f, " else {e}")
                    }
                    Some(e) => write!(f, " else {{ {e} }}"),
                    None => Ok(()),
                }
            }
            ExprKind::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            ExprKind::Not(inner) => {
                f.write_str("!")?;
                write_operand(f, inner)
            }
            ExprKind::Negate(inner) => {
                f.write_str("-")?;
                write_operand(f, inner)
            }
            ExprKind::Number(n) => write!(f, "{n}"),
            ExprKind::Duration(m) => write!(f, "{m}min"),
            ExprKind::Condition(v) => f.write_str(v.name()),
            ExprKind::Direction(d) => f.write_str(d.name()),
            ExprKind::Base(b) => write!(f, "{b}"),
            ExprKind::CustomBase { start, end } => write!(f, "custom({start}, {end})"),
            ExprKind::Date { day, month } => {
                let name = month
                    .checked_sub(1)
                    .and_then(|i| MONTH_NAMES.get(i as usize))
                    .copied()
                    .unwrap_or("Jan");
                write!(f, "{day}-{name}")
            }
            ExprKind::Text(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            ExprKind::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Writes a sub-expression, parenthesized if it is itself an operator.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr.kind {
        ExprKind::Binary { .. }
        | ExprKind::Offset { .. }
        | ExprKind::Conditional { .. }
        | ExprKind::Not(_)
        | ExprKind::Negate(_) => write!(f, "({expr})"),
        ExprKind::Number(n) if n < 0.0 => write!(f, "({expr})"),
        ExprKind::Duration(m) if m < 0.0 => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

fn write_list<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Expr>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
