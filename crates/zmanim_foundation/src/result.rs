//! Calculation requests flags and results.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::formula::RoundingMode;

/// Which otherwise-hidden formulas a calculation includes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalcFlags {
    /// Include formulas whose `enabled` flag is false.
    pub include_disabled: bool,
    /// Include formulas whose `published` flag is false.
    pub include_unpublished: bool,
    /// Include formulas marked beta.
    pub include_beta: bool,
    /// Skip tag filtering; every formula is computed and marked with
    /// whether it would have been active today.
    pub include_inactive: bool,
}

impl CalcFlags {
    /// Flags for a publisher's own editor view: everything included.
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            include_disabled: true,
            include_unpublished: true,
            include_beta: true,
            include_inactive: true,
        }
    }

    /// Packs the flags into bits for cache keys.
    #[must_use]
    pub const fn bits(self) -> u8 {
        (self.include_disabled as u8)
            | (self.include_unpublished as u8) << 1
            | (self.include_beta as u8) << 2
            | (self.include_inactive as u8) << 3
    }
}

/// One formula's result on one date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatedZman {
    /// The formula key.
    pub key: String,
    /// The instant in the location's local time, or `None` if it has no value.
    pub instant: Option<DateTime<FixedOffset>>,
    /// Exact local time, `HH:MM:SS`.
    pub time_exact: Option<String>,
    /// Local time rounded per `rounding`, `HH:MM`.
    pub time_rounded: Option<String>,
    /// Rounding applied to `time_rounded`.
    pub rounding: RoundingMode,
    /// Whether the formula's tags match today's events.
    pub is_active_today: bool,
    /// Why `instant` is missing, or a warning about how it was computed.
    pub diagnostic: Option<Diagnostic>,
}

impl CalculatedZman {
    /// Creates a result with no value and the given diagnostic.
    #[must_use]
    pub fn failed(key: impl Into<String>, diagnostic: Diagnostic) -> Self {
        Self {
            key: key.into(),
            instant: None,
            time_exact: None,
            time_rounded: None,
            rounding: RoundingMode::default(),
            is_active_today: true,
            diagnostic: Some(diagnostic),
        }
    }

    /// Returns true if this entry has a value.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.instant.is_some()
    }
}

/// All calculated zmanim for one date, in display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    /// The local calendar date.
    pub date: NaiveDate,
    /// Results in display order.
    pub zmanim: Vec<CalculatedZman>,
    /// Whether this result was served from the result cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl DayResult {
    /// Creates a day result.
    #[must_use]
    pub const fn new(date: NaiveDate, zmanim: Vec<CalculatedZman>) -> Self {
        Self {
            date,
            zmanim,
            from_cache: false,
        }
    }

    /// Looks up a result by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CalculatedZman> {
        self.zmanim.iter().find(|z| z.key == key)
    }

    /// Returns the keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.zmanim.iter().map(|z| z.key.as_str())
    }
}
