//! Type descriptors for formula values and function signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a [`Value`](crate::Value), used in type errors and static checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// No event (astronomically undefined).
    Null,
    /// A point in time.
    Instant,
    /// A signed span of time.
    Duration,
    /// A plain number.
    Number,
    /// A truth value.
    Bool,
    /// A string.
    Text,
    /// A direction keyword such as `before_visible_sunrise`.
    Direction,
    /// A day-span base such as `gra` or `custom(a, b)`.
    Base,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Instant => "time",
            Self::Duration => "duration",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Text => "string",
            Self::Direction => "direction",
            Self::Base => "base",
        };
        f.write_str(name)
    }
}

/// How many arguments a function takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly N arguments.
    Exact(usize),
    /// Between min and max arguments (inclusive).
    Range(usize, usize),
    /// At least N arguments, then any number more.
    Variadic(usize),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::Variadic(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
            Self::Variadic(min) => write!(f, "at least {min}"),
        }
    }
}
