//! Publisher formula definitions, tags and active event codes.

use std::fmt;
use std::str::FromStr;

use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Tags
// =============================================================================

/// What a tag describes.
///
/// Only [`TagKind::Event`] and [`TagKind::JewishDay`] tags restrict the days a
/// formula applies to. [`TagKind::Timing`] tags change how event tags match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// A calendar event such as `chanukah` or `shabbos`.
    Event,
    /// A kind of day such as `rosh_chodesh` or `fast_day`.
    JewishDay,
    /// A timing modifier: `day_before` or `motzei`.
    Timing,
    /// A descriptive grouping with no filtering effect.
    Category,
    /// The halachic opinion a formula follows; descriptive only.
    Shita,
}

impl TagKind {
    /// Returns true if tags of this kind restrict when a formula applies.
    #[must_use]
    pub const fn filters(self) -> bool {
        matches!(self, Self::Event | Self::JewishDay)
    }

    /// Returns the prefix used in the textual tag form.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::JewishDay => "jewish_day",
            Self::Timing => "timing",
            Self::Category => "category",
            Self::Shita => "shita",
        }
    }
}

/// A tag attached to a formula definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormulaTag {
    /// The tag key, matched against active event codes.
    pub key: String,
    /// What the tag describes.
    pub kind: TagKind,
    /// A negated tag excludes the formula while its event is active.
    #[serde(default)]
    pub negated: bool,
}

impl FormulaTag {
    /// Creates an event tag.
    #[must_use]
    pub fn event(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: TagKind::Event,
            negated: false,
        }
    }

    /// Creates a tag of the given kind.
    #[must_use]
    pub fn with_kind(key: impl Into<String>, kind: TagKind) -> Self {
        Self {
            key: key.into(),
            kind,
            negated: false,
        }
    }

    /// Creates a timing tag.
    #[must_use]
    pub fn timing(key: impl Into<String>) -> Self {
        Self::with_kind(key, TagKind::Timing)
    }

    /// Returns this tag negated.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }
}

impl FromStr for FormulaTag {
    type Err = Error;

    /// Parses `[!][kind:]key`, e.g. `chanukah`, `!shabbos`, `timing:day_before`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (negated, rest) = s.strip_prefix('!').map_or((false, s), |r| (true, r));
        let (kind, key) = match rest.split_once(':') {
            Some(("event", key)) => (TagKind::Event, key),
            Some(("jewish_day", key)) => (TagKind::JewishDay, key),
            Some(("timing", key)) => (TagKind::Timing, key),
            Some(("category", key)) => (TagKind::Category, key),
            Some(("shita", key)) => (TagKind::Shita, key),
            Some((other, _)) => {
                return Err(Error::invalid_argument(format!("unknown tag kind '{other}'")));
            }
            None => (TagKind::Event, rest),
        };
        if key.is_empty() {
            return Err(Error::invalid_argument(format!("empty tag in '{s}'")));
        }
        Ok(Self {
            key: key.to_string(),
            kind,
            negated,
        })
    }
}

impl fmt::Display for FormulaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        if self.kind != TagKind::Event {
            write!(f, "{}:", self.kind.prefix())?;
        }
        f.write_str(&self.key)
    }
}

// =============================================================================
// Active events
// =============================================================================

/// The calendar event codes active on a date at a location.
///
/// Backed by a persistent ordered set: iteration is sorted, which keeps
/// cache keys canonical, and clones are cheap when a range shares codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveEvents(OrdSet<String>);

impl ActiveEvents {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(OrdSet::new())
    }

    /// Returns true if `code` is active.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// Adds a code.
    pub fn insert(&mut self, code: impl Into<String>) {
        self.0.insert(code.into());
    }

    /// Returns the number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no codes are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Returns the codes as a sorted vector.
    #[must_use]
    pub fn sorted_codes(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveEvents {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Rounding
// =============================================================================

/// How a calculated instant is rounded to the minute for display.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Always round down.
    Floor,
    /// Round up when there are any seconds.
    Ceil,
    /// Round half up at 30 seconds.
    #[default]
    Math,
}

impl FromStr for RoundingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "floor" => Ok(Self::Floor),
            "ceil" => Ok(Self::Ceil),
            "math" | "" => Ok(Self::Math),
            other => Err(Error::invalid_argument(format!(
                "unknown rounding mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Math => "math",
        })
    }
}

// =============================================================================
// Formula definition
// =============================================================================

const fn default_true() -> bool {
    true
}

/// One zman as configured by a publisher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulaDefinition {
    /// Key, unique within the publisher's set; the target of `@key`.
    pub key: String,
    /// Formula text in the DSL.
    pub formula: String,
    /// Tags controlling which days the formula applies to.
    #[serde(default)]
    pub tags: Vec<FormulaTag>,
    /// Disabled formulas are skipped unless explicitly included.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Unpublished formulas are skipped unless explicitly included.
    #[serde(default = "default_true")]
    pub published: bool,
    /// Beta formulas are skipped unless explicitly included.
    #[serde(default)]
    pub beta: bool,
    /// Position in the day result; ties are broken by key.
    #[serde(default)]
    pub display_order: i32,
    /// Rounding applied to the displayed time.
    #[serde(default)]
    pub rounding: RoundingMode,
}

impl FormulaDefinition {
    /// Creates an enabled, published, non-beta definition.
    #[must_use]
    pub fn new(key: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            formula: formula.into(),
            tags: Vec::new(),
            enabled: true,
            published: true,
            beta: false,
            display_order: 0,
            rounding: RoundingMode::Math,
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: FormulaTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Sets the display order.
    #[must_use]
    pub const fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }

    /// Sets the rounding mode.
    #[must_use]
    pub const fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the published flag.
    #[must_use]
    pub const fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// Sets the beta flag.
    #[must_use]
    pub const fn with_beta(mut self, beta: bool) -> Self {
        self.beta = beta;
        self
    }
}
