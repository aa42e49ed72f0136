//! Error types for the zmanim engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Formula-level errors are cloneable so the per-date memo can hand the
//! same failure to every formula that depends on it.

use std::fmt;

use thiserror::Error;

use crate::ids::{LocalityId, PublisherId};
use crate::types::ValueType;

/// Result type for zmanim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for zmanim operations.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a syntax error at a source position.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates an unknown identifier error at a source position.
    #[must_use]
    pub fn unknown_identifier(name: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::UnknownIdentifier {
            name: name.into(),
            line,
            column,
        })
    }

    /// Creates an undefined reference error.
    #[must_use]
    pub fn undefined_reference(key: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedReference(key.into()))
    }

    /// Creates a reference cycle error. `path` lists the keys in visiting
    /// order and ends with the key that closed the cycle.
    #[must_use]
    pub fn cycle(path: Vec<String>) -> Self {
        Self::new(ErrorKind::Cycle(path))
    }

    /// Creates a domain error (astronomically undefined value).
    #[must_use]
    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain(message.into()))
    }

    /// Creates a dependency failure error.
    #[must_use]
    pub fn dependency_failed(key: impl Into<String>, reason: &Error) -> Self {
        Self::new(ErrorKind::DependencyFailed {
            key: key.into(),
            reason: reason.to_string(),
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: ValueType) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(function: impl Into<String>, expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            function: function.into(),
            expected,
            actual,
        })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Creates an invalid request range error.
    #[must_use]
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRange(message.into()))
    }

    /// Returns true if this error came from parsing formula text.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Syntax { .. } | ErrorKind::UnknownIdentifier { .. }
        )
    }

    /// Returns true if this error rejects a whole request rather than one formula.
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidRange(_)
                | ErrorKind::UnknownPublisher(_)
                | ErrorKind::UnknownLocality(_)
                | ErrorKind::InvalidTimezone(_)
        )
    }

    /// Returns true if `first_valid` may skip past this error to the next operand.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::Domain(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Clone, Debug, Error)]
pub enum ErrorKind {
    /// Formula text is malformed.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A bare identifier is not a primitive, function, base, direction or keyword.
    #[error("unknown identifier '{name}' at {line}:{column}")]
    UnknownIdentifier {
        /// The identifier as written.
        name: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// `@key` does not name an available formula.
    #[error("undefined reference: @{0}")]
    UndefinedReference(String),

    /// A chain of references loops back on itself.
    #[error("reference cycle: {}", format_cycle(.0))]
    Cycle(Vec<String>),

    /// An astronomically undefined instant reached a place that needs a value.
    #[error("no event: {0}")]
    Domain(String),

    /// A referenced formula failed to evaluate.
    #[error("dependency @{key} failed: {reason}")]
    DependencyFailed {
        /// The referenced key.
        key: String,
        /// Why it failed.
        reason: String,
    },

    /// Operand types do not fit the operation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Description of what was expected.
        expected: String,
        /// The type actually found.
        actual: ValueType,
    },

    /// Wrong number of arguments to a function.
    #[error("{function}() expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// The function name.
        function: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// An argument value is out of its allowed domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A request's date span is malformed or too large.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The publisher is not known to the formula source.
    #[error("unknown publisher: {0}")]
    UnknownPublisher(PublisherId),

    /// The locality is not known to the location provider.
    #[error("unknown locality: {0}")]
    UnknownLocality(LocalityId),

    /// A timezone name is not a known IANA zone.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Encoding or decoding a cached or stored value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_cycle(path: &[String]) -> String {
    path.iter()
        .map(|key| format!("@{key}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Context about where an error occurred.
#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    /// Formula key or file the error belongs to.
    pub source: Option<String>,
    /// The formula text, when available.
    pub formula: Option<String>,
    /// Chain of references being resolved when the error occurred.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the formula text.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Adds a resolution frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if let Some(formula) = &self.formula {
            write!(f, " `{formula}`")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  via @{frame}")?;
            }
        }
        Ok(())
    }
}
