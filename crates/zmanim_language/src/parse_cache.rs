//! Process-wide cache of parsed formulas.
//!
//! Formula text changes far less often than it is evaluated, so parsed trees
//! are shared by text. Entries are immutable once built; two callers racing
//! on the same text build equal trees and either may win.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use zmanim_foundation::Result;

use crate::ast::Expr;
use crate::parser::parse;

static GLOBAL: LazyLock<ParseCache> = LazyLock::new(ParseCache::new);

/// Parses `text` through the process-wide cache.
///
/// # Errors
/// Returns the parse error if `text` is not a valid formula. Failures are not cached.
pub fn parse_cached(text: &str) -> Result<Arc<Expr>> {
    GLOBAL.get_or_parse(text)
}

/// The process-wide cache used by [`parse_cached`].
#[must_use]
pub fn global() -> &'static ParseCache {
    &GLOBAL
}

/// A map from formula text to its parsed tree.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: RwLock<HashMap<String, Arc<Expr>>>,
}

impl ParseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tree for `text`, parsing and storing it on a miss.
    ///
    /// # Errors
    /// Returns the parse error if `text` is not a valid formula.
    pub fn get_or_parse(&self, text: &str) -> Result<Arc<Expr>> {
        if let Some(expr) = self.entries.read().get(text) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(parse(text)?);
        let mut entries = self.entries.write();
        Ok(Arc::clone(
            entries.entry(text.to_string()).or_insert(expr),
        ))
    }

    /// Returns true if `text` has been parsed and cached.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.entries.read().contains_key(text)
    }

    /// Drops the entry for `text`.
    pub fn remove(&self, text: &str) -> bool {
        self.entries.write().remove(text).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
