//! Core types, values, errors and the formula data model for the zmanim engine.
//!
//! This crate provides:
//! - [`Value`] - The value type produced by evaluating formulas
//! - [`Error`] - Rich error types with context, and [`Diagnostic`] for per-formula reporting
//! - [`Location`] - Where a calculation happens
//! - [`FormulaDefinition`] and [`FormulaTag`] - A publisher's formula set
//! - [`DayResult`] and [`CalculatedZman`] - What a calculation produces

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diagnostic;
pub mod error;
pub mod formula;
pub mod ids;
pub mod location;
pub mod result;
pub mod types;
pub mod value;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use formula::{ActiveEvents, FormulaDefinition, FormulaTag, RoundingMode, TagKind};
pub use ids::{LocalityId, PublisherId};
pub use location::Location;
pub use result::{CalcFlags, CalculatedZman, DayResult};
pub use types::{Arity, ValueType};
pub use value::{Value, delta_minutes, format_duration, minutes_to_delta, scale_delta};
