//! Engine configuration.

use std::time::Duration;

/// Longest range, in days, a single range request may cover.
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 366;

/// How long a cached day result stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a [`crate::CalculationService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Lifetime of result cache entries.
    pub cache_ttl: Duration,
    /// Maximum number of days in one range request.
    pub max_range_days: u32,
    /// Fail references to undefined keys instead of evaluating them to null.
    pub strict_references: bool,
    /// Whether day results are cached at all.
    pub cache_enabled: bool,
    /// Whether results carry a rounded `HH:MM` time.
    pub rounding_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            strict_references: false,
            cache_enabled: true,
            rounding_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with strict reference checking.
    #[must_use]
    pub fn strict() -> Self {
        Self::default().with_strict_references(true)
    }

    /// Default configuration with the result cache turned off.
    #[must_use]
    pub fn uncached() -> Self {
        Self::default().with_cache_enabled(false)
    }

    /// Builder method to set the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder method to set the range limit.
    #[must_use]
    pub const fn with_max_range_days(mut self, days: u32) -> Self {
        self.max_range_days = days;
        self
    }

    /// Builder method to set strict reference checking.
    #[must_use]
    pub const fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// Builder method to turn the result cache on or off.
    #[must_use]
    pub const fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Builder method to turn rounded times on or off.
    #[must_use]
    pub const fn with_rounding_enabled(mut self, enabled: bool) -> Self {
        self.rounding_enabled = enabled;
        self
    }
}
