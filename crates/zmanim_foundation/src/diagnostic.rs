//! Per-formula diagnostics attached to calculated results.
//!
//! A [`Diagnostic`] is the serializable, user-facing form of a formula-level
//! [`Error`]. Only the kinds a publisher can act on are distinguished.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Broad classification of a formula failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The formula text does not parse.
    Syntax,
    /// The formula uses an identifier the language does not know.
    UnknownIdentifier,
    /// The formula references a key that is missing or disabled.
    UndefinedReference,
    /// The formula takes part in a reference cycle.
    Cycle,
    /// The formula has no value on this date at this location.
    Domain,
    /// Any other evaluation failure (types, arguments, failed dependencies).
    Evaluation,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax",
            Self::UnknownIdentifier => "unknown_identifier",
            Self::UndefinedReference => "undefined_reference",
            Self::Cycle => "cycle",
            Self::Domain => "domain",
            Self::Evaluation => "evaluation",
        };
        f.write_str(name)
    }
}

/// A diagnostic attached to one calculated zman.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The kind of failure.
    pub kind: DiagnosticKind,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic for a formula that evaluated to no event.
    #[must_use]
    pub fn no_event(key: &str) -> Self {
        Self::new(
            DiagnosticKind::Domain,
            format!("@{key} has no value on this date at this location"),
        )
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let kind = match &err.kind {
            ErrorKind::Syntax { .. } => DiagnosticKind::Syntax,
            ErrorKind::UnknownIdentifier { .. } => DiagnosticKind::UnknownIdentifier,
            ErrorKind::UndefinedReference(_) => DiagnosticKind::UndefinedReference,
            ErrorKind::Cycle(_) => DiagnosticKind::Cycle,
            ErrorKind::Domain(_) => DiagnosticKind::Domain,
            _ => DiagnosticKind::Evaluation,
        };
        Self::new(kind, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
