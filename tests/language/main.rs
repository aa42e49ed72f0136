//! Integration tests for Layer 2: Language
//!
//! Tests for the lexer, parser, static validation and evaluation.

mod lexer;
mod parser;
mod validation;
