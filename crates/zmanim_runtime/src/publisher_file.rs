//! Publisher files: one locality and one formula set in TOML.
//!
//! ```toml
//! [publisher]
//! id = 1
//! name = "Lakewood Kollel"
//!
//! [locality]
//! id = 4993
//! name = "Lakewood, NJ"
//! latitude = 40.0828
//! longitude = -74.2094
//! elevation = 20
//! timezone = "America/New_York"
//!
//! [[zman]]
//! key = "candle_lighting"
//! formula = "sunset - 18min"
//! tags = ["shabbos", "timing:day_before"]
//! rounding = "floor"
//!
//! [events]
//! "2025-12-26" = ["erev_shabbos", "chanukah"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use zmanim_engine::{CalculationService, EngineConfig, InMemoryDirectory, StaticCalendar};
use zmanim_foundation::{
    Error, ErrorKind, FormulaDefinition, FormulaTag, LocalityId, Location, PublisherId, Result,
    RoundingMode,
};
use zmanim_language::{Expr, ValidationIssue, calculation_order, parse_cached, validate_formula};

const fn default_true() -> bool {
    true
}

/// The `[publisher]` table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PublisherSection {
    /// Publisher id used for cache keys.
    #[serde(default)]
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// The `[locality]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocalitySection {
    /// Locality id used for cache keys.
    #[serde(default)]
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Elevation in meters.
    #[serde(default)]
    pub elevation: f64,
    /// IANA timezone name.
    pub timezone: String,
    /// Whether the locality is in Israel.
    #[serde(default)]
    pub is_israel: bool,
}

/// One `[[zman]]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ZmanSection {
    /// Formula key.
    pub key: String,
    /// Formula text.
    pub formula: String,
    /// Tags as written, e.g. `"!shabbos"` or `"timing:day_before"`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the formula is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the formula is published.
    #[serde(default = "default_true")]
    pub published: bool,
    /// Whether the formula is beta.
    #[serde(default)]
    pub beta: bool,
    /// Position in results.
    #[serde(default)]
    pub display_order: i32,
    /// Rounding of the displayed time.
    #[serde(default)]
    pub rounding: RoundingMode,
}

/// A parsed publisher file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PublisherFile {
    /// Publisher identity.
    #[serde(default)]
    pub publisher: PublisherSection,
    /// Where the formulas are calculated.
    pub locality: LocalitySection,
    /// The formula set.
    #[serde(default, rename = "zman")]
    pub zmanim: Vec<ZmanSection>,
    /// Event codes by ISO date, for dates the calendar should know about.
    #[serde(default)]
    pub events: BTreeMap<String, Vec<String>>,
}

impl PublisherFile {
    /// Reads and parses a publisher file.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Io`] if the file cannot be read, or
    /// [`ErrorKind::Serialization`] if it is not a valid publisher file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Io(format!("failed to read {}: {e}", path.display())))
        })?;
        toml::from_str(&text).map_err(|e| {
            Error::new(ErrorKind::Serialization(format!("{}: {e}", path.display())))
        })
    }

    /// Parses publisher file text.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Serialization`] if the text is not a valid publisher file.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
    }

    /// The publisher id.
    #[must_use]
    pub const fn publisher_id(&self) -> PublisherId {
        PublisherId::new(self.publisher.id)
    }

    /// The locality id.
    #[must_use]
    pub const fn locality_id(&self) -> LocalityId {
        LocalityId::new(self.locality.id)
    }

    /// The locality as a [`Location`].
    ///
    /// # Errors
    /// Returns an error for an unknown timezone or out-of-range coordinates.
    pub fn location(&self) -> Result<Location> {
        let section = &self.locality;
        let mut location =
            Location::with_timezone_name(section.latitude, section.longitude, &section.timezone)?
                .with_elevation(section.elevation)
                .with_israel(section.is_israel);
        if let Some(name) = &section.name {
            location = location.with_name(name.clone());
        }
        Ok(location)
    }

    /// The formula set.
    ///
    /// # Errors
    /// Returns an error naming the formula if one of its tags is malformed.
    pub fn definitions(&self) -> Result<Vec<FormulaDefinition>> {
        self.zmanim.iter().map(ZmanSection::to_definition).collect()
    }

    /// A calendar answering from the `[events]` table.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidArgument`] for a key that is not an ISO date.
    pub fn calendar(&self) -> Result<StaticCalendar> {
        let mut calendar = StaticCalendar::new();
        for (date, codes) in &self.events {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                Error::invalid_argument(format!("[events] key '{date}' is not a YYYY-MM-DD date"))
            })?;
            calendar.set_day(date, codes.iter().map(String::as_str));
        }
        Ok(calendar)
    }

    /// Statically checks every formula against the rest of the set.
    ///
    /// Returns `(key, issue)` pairs, plus one issue for the first reference
    /// cycle among formulas that parse.
    #[must_use]
    pub fn check(&self) -> Vec<(String, ValidationIssue)> {
        let keys: Vec<&str> = self.zmanim.iter().map(|z| z.key.as_str()).collect();
        let mut findings: Vec<(String, ValidationIssue)> = self
            .zmanim
            .iter()
            .flat_map(|z| {
                validate_formula(&z.formula, Some(z.key.as_str()), &keys)
                    .into_iter()
                    .map(|issue| (z.key.clone(), issue))
            })
            .collect();

        let parsed: Vec<(&str, Arc<Expr>)> = self
            .zmanim
            .iter()
            .filter_map(|z| parse_cached(&z.formula).ok().map(|e| (z.key.as_str(), e)))
            .collect();
        if let Err(err) = calculation_order(parsed.iter().map(|(k, e)| (*k, e.as_ref()))) {
            // self-references are already reported per formula
            if let ErrorKind::Cycle(path) = &err.kind {
                if path.len() > 2 {
                    findings.push((path[0].clone(), ValidationIssue::from(&err)));
                }
            }
        }
        findings
    }

    /// Builds a calculation service holding this file's locality and formulas.
    ///
    /// # Errors
    /// Returns an error if the locality, tags or events are invalid.
    pub fn service(&self, config: EngineConfig) -> Result<CalculationService> {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_locality(self.locality_id(), self.location()?);
        directory.insert_publisher(self.publisher_id(), self.definitions()?);
        Ok(CalculationService::with_directory(
            config,
            directory,
            Arc::new(self.calendar()?),
        ))
    }
}

impl ZmanSection {
    fn to_definition(&self) -> Result<FormulaDefinition> {
        let tags = self
            .tags
            .iter()
            .map(|t| t.parse::<FormulaTag>())
            .collect::<Result<Vec<_>>>()
            .map_err(|err| Error::invalid_argument(format!("zman '{}': {err}", self.key)))?;
        let mut definition = FormulaDefinition::new(self.key.clone(), self.formula.clone())
            .with_enabled(self.enabled)
            .with_published(self.published)
            .with_beta(self.beta)
            .with_display_order(self.display_order)
            .with_rounding(self.rounding);
        definition.tags = tags;
        Ok(definition)
    }
}
