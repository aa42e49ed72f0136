//! Lexer, parser, validator and evaluator for the zmanim formula DSL.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of formula text
//! - [`parse`] - Parsing formula text into an [`Expr`]
//! - [`parse_cached`] - The process-wide parse cache
//! - [`validate_formula`] - Static checks with every finding reported
//! - [`EvaluationContext`] - Per-date evaluation with reference resolution
//!   and cycle detection

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod context;
mod eval;
mod functions;
pub mod lexer;
pub mod parse_cache;
pub mod parser;
mod pretty;
pub mod span;
pub mod token;
pub mod validate;


pub use ast::{
    Base, BinaryOp, ConditionVar, Direction, Expr, ExprKind, Function, Primitive,
    known_identifiers,
};
pub use context::{BreakdownStep, Evaluation, EvaluationContext, FormulaTable};
pub use eval::season;
pub use functions::MAX_DEGREES;
pub use lexer::Lexer;
pub use parse_cache::{ParseCache, parse_cached};
pub use parser::{MAX_DEPTH, Parser, parse};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use validate::{
    ValidationIssue, accepts_direction, calculation_order, references, validate_formula,
};
