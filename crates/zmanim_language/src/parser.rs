//! Parser for the formula DSL.
//!
//! A recursive-descent parser over one expression grammar. From loosest to
//! tightest binding:
//!
//! ```text
//! ||   &&   !   == != < <= > >=   + -   * /   unary -   primary
//! ```
//!
//! `base + <duration literal>` and `base - <duration literal>` become
//! [`ExprKind::Offset`] nodes. Bare identifiers are resolved here; an
//! unknown name fails immediately, while `@key` references are left for
//! evaluation.

use zmanim_foundation::{Error, Result};

use crate::ast::{Base, BinaryOp, ConditionVar, Direction, Expr, ExprKind, Function, Primitive};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Deepest expression tree accepted: groups, calls, prefix operators,
/// `else if` links and operators folded into a chain each add a level.
pub const MAX_DEPTH: usize = 128;

/// Parses formula text into an expression.
///
/// # Errors
/// Returns a syntax, unknown-identifier or arity error describing the first problem found.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source).parse()
}

/// Parser for formula text.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Span of the last consumed token.
    previous: Span,
    /// Current nesting depth.
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = next_significant(&mut lexer);
        Self {
            lexer,
            current,
            previous: Span::at_start(),
            depth: 0,
        }
    }

    /// Parses the whole source as one expression.
    ///
    /// # Errors
    /// Returns an error if the source is empty, malformed, or has trailing input.
    pub fn parse(&mut self) -> Result<Expr> {
        if self.current.kind == TokenKind::Eof {
            return Err(self.error("empty formula"));
        }
        let expr = self.parse_expr()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.error(&format!(
                "unexpected {} after expression",
                self.current.kind.name()
            )));
        }
        Ok(expr)
    }

    // =========================================================================
    // Token handling
    // =========================================================================

    fn advance(&mut self) {
        self.previous = self.current.span;
        self.current = next_significant(&mut self.lexer);
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span> {
        if self.check(kind) {
            let span = self.current.span;
            self.advance();
            Ok(span)
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                kind.name(),
                self.current.kind.name()
            )))
        }
    }

    fn error(&self, message: &str) -> Error {
        match &self.current.kind {
            TokenKind::Error(lexer_message) => Error::syntax(
                lexer_message.clone(),
                self.current.span.line,
                self.current.span.column,
            ),
            _ => Error::syntax(message, self.current.span.line, self.current.span.column),
        }
    }

    // =========================================================================
    // Precedence levels
    // =========================================================================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Self::parse_or)
    }

    /// Runs `parse` one level deeper, failing past [`MAX_DEPTH`].
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("formula is nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Counts one operator folded into a left-associative chain. Each one
    /// deepens the tree by a level, so chains share the nesting limit.
    fn fold(&mut self, folded: &mut usize) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("formula is nested too deeply"));
        }
        self.depth += 1;
        *folded += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        let mut folded = 0;
        while self.check(&TokenKind::OrOr) {
            self.fold(&mut folded)?;
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        self.depth -= folded;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        let mut folded = 0;
        while self.check(&TokenKind::AndAnd) {
            self.fold(&mut folded)?;
            self.advance();
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right);
        }
        self.depth -= folded;
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Bang) {
            let start = self.current.span;
            self.advance();
            let inner = self.nested(Self::parse_not)?;
            let span = start.to(inner.span);
            return Ok(Expr::new(ExprKind::Not(Box::new(inner)), span));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = comparison_op(&self.current.kind) else {
            return Ok(left);
        };
        self.advance();
        let right = self.parse_additive()?;
        if comparison_op(&self.current.kind).is_some() {
            return Err(self.error("comparison operators cannot be chained"));
        }
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        let mut folded = 0;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.fold(&mut folded)?;
            self.advance();
            let right = self.parse_multiplicative()?;
            left = match right.kind {
                ExprKind::Duration(minutes) => {
                    let span = left.span.to(right.span);
                    let minutes = if op == BinaryOp::Add { minutes } else { -minutes };
                    Expr::new(
                        ExprKind::Offset {
                            base: Box::new(left),
                            minutes,
                        },
                        span,
                    )
                }
                _ => binary(op, left, right),
            };
        }
        self.depth -= folded;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        let mut folded = 0;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.fold(&mut folded)?;
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        self.depth -= folded;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if !self.check(&TokenKind::Minus) {
            return self.parse_primary();
        }
        let start = self.current.span;
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        let span = start.to(operand.span);
        let kind = match operand.kind {
            ExprKind::Number(n) => ExprKind::Number(-n),
            ExprKind::Duration(m) => ExprKind::Duration(-m),
            _ => ExprKind::Negate(Box::new(operand)),
        };
        Ok(Expr::new(kind, span))
    }

    // =========================================================================
    // Primaries
    // =========================================================================

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::Number(n) => ExprKind::Number(*n),
            TokenKind::Duration(m) => ExprKind::Duration(*m),
            TokenKind::Date { day, month } => ExprKind::Date {
                day: *day,
                month: *month,
            },
            TokenKind::String(s) => ExprKind::Text(s.clone()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Reference(key) => ExprKind::Reference(key.clone()),
            TokenKind::LParen => return self.parse_group(),
            TokenKind::If => return self.parse_conditional(),
            TokenKind::Ident(name) => {
                let name = name.clone();
                return self.parse_identifier(name);
            }
            TokenKind::Eof => return Err(self.error("unexpected end of formula")),
            other => {
                return Err(self.error(&format!("expected expression, found {}", other.name())));
            }
        };
        self.advance();
        Ok(Expr::new(kind, span))
    }

    /// Parses `( expr )`.
    fn parse_group(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let inner = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        Ok(inner)
    }

    /// Parses `if cond { expr } [else if ... | else { expr }]`.
    fn parse_conditional(&mut self) -> Result<Expr> {
        let start = self.expect(&TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                Some(Box::new(self.nested(Self::parse_conditional)?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            start.to(self.previous),
        ))
    }

    /// Parses `{ expr }`.
    fn parse_block(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LBrace)?;
        let inner = self.parse_expr()?;
        self.expect(&TokenKind::RBrace)?;
        Ok(inner)
    }

    /// Resolves a bare identifier, or a call if `(` follows.
    fn parse_identifier(&mut self, name: String) -> Result<Expr> {
        let span = self.current.span;
        self.advance();

        if self.check(&TokenKind::LParen) {
            return self.parse_call(&name, span);
        }

        let kind = if let Some(p) = Primitive::from_name(&name) {
            ExprKind::Primitive(p)
        } else if let Some(d) = Direction::from_name(&name) {
            ExprKind::Direction(d)
        } else if let Some(b) = Base::from_name(&name) {
            ExprKind::Base(b)
        } else if let Some(v) = ConditionVar::from_name(&name) {
            ExprKind::Condition(v)
        } else if Function::from_name(&name).is_some() || name == "custom" {
            return Err(Error::syntax(
                format!("{name} must be called with arguments"),
                span.line,
                span.column,
            ));
        } else {
            return Err(Error::unknown_identifier(name, span.line, span.column));
        };
        Ok(Expr::new(kind, span))
    }

    /// Parses a call whose name has been consumed.
    fn parse_call(&mut self, name: &str, span: Span) -> Result<Expr> {
        let function = Function::from_name(name);
        if function.is_none() && name != "custom" {
            let known = Primitive::from_name(name).is_some()
                || Direction::from_name(name).is_some()
                || Base::from_name(name).is_some()
                || ConditionVar::from_name(name).is_some();
            return Err(if known {
                Error::syntax(format!("{name} is not a function"), span.line, span.column)
            } else {
                Error::unknown_identifier(name, span.line, span.column)
            });
        }

        let args = self.parse_arguments()?;
        let full = span.to(self.previous);

        let Some(function) = function else {
            let [start, end]: [Expr; 2] = args
                .try_into()
                .map_err(|a: Vec<Expr>| Error::arity_mismatch("custom", "2".into(), a.len()))?;
            return Ok(Expr::new(
                ExprKind::CustomBase {
                    start: Box::new(start),
                    end: Box::new(end),
                },
                full,
            ));
        };

        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(Error::arity_mismatch(
                function.name(),
                arity.to_string(),
                args.len(),
            ));
        }
        Ok(Expr::new(ExprKind::Call(function, args), full))
    }

    /// Parses `( arg, arg, ... )`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.current.kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => {
                    return Err(self.error(&format!(
                        "expected ',' or ')' in argument list, found {}",
                        self.current.kind.name()
                    )));
                }
            }
        }
    }
}

/// Next token that is not a comment.
fn next_significant(lexer: &mut Lexer<'_>) -> Token {
    loop {
        let token = lexer.next_token();
        if !token.kind.is_trivia() {
            return token;
        }
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::BangEq => Some(BinaryOp::Ne),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::Le),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::Ge),
        _ => None,
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}
