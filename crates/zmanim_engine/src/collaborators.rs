//! Interfaces to the systems that feed the engine.
//!
//! Localities, publisher formula sets and calendar events live outside the
//! engine. The engine sees them through these traits; the in-memory
//! implementations back tests, the CLI and anything else that already has
//! its data at hand.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use zmanim_foundation::{
    ActiveEvents, Error, ErrorKind, FormulaDefinition, LocalityId, Location, PublisherId, Result,
};

/// Resolves a locality to a location, with publisher overrides applied.
pub trait LocationProvider: Send + Sync {
    /// The effective location of `locality` for `publisher`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownLocality`] if the locality does not exist.
    fn location(&self, publisher: PublisherId, locality: LocalityId) -> Result<Location>;
}

/// Supplies a publisher's formula definitions.
pub trait FormulaSource: Send + Sync {
    /// Every definition the publisher has, including disabled ones.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownPublisher`] if the publisher does not exist.
    fn formulas(&self, publisher: PublisherId) -> Result<Vec<FormulaDefinition>>;
}

/// Supplies the calendar event codes active on a date.
pub trait CalendarProvider: Send + Sync {
    /// Event codes active on `date` at `location`.
    fn active_events(&self, date: NaiveDate, location: &Location) -> ActiveEvents;

    /// Event codes for each date from `start` to `end` inclusive, in order.
    ///
    /// The default asks one date at a time; providers with a cheaper batch
    /// lookup should override it.
    fn active_events_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: &Location,
    ) -> Vec<ActiveEvents> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.active_events(d, location))
            .collect()
    }
}

// =============================================================================
// In-memory implementations
// =============================================================================

/// Localities and publisher formula sets held in memory.
///
/// Edits through this type do not touch any result cache; callers that
/// cache must invalidate the publisher afterwards.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    localities: RwLock<HashMap<LocalityId, Location>>,
    overrides: RwLock<HashMap<(PublisherId, LocalityId), Location>>,
    publishers: RwLock<HashMap<PublisherId, Vec<FormulaDefinition>>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a locality.
    pub fn insert_locality(&self, id: LocalityId, location: Location) {
        self.localities.write().insert(id, location);
    }

    /// Sets a publisher-specific location for a locality.
    pub fn set_override(&self, publisher: PublisherId, locality: LocalityId, location: Location) {
        self.overrides.write().insert((publisher, locality), location);
    }

    /// Removes a publisher-specific location. Returns true if one existed.
    pub fn clear_override(&self, publisher: PublisherId, locality: LocalityId) -> bool {
        self.overrides.write().remove(&(publisher, locality)).is_some()
    }

    /// Adds or replaces a publisher's formula set.
    pub fn insert_publisher(&self, id: PublisherId, formulas: Vec<FormulaDefinition>) {
        self.publishers.write().insert(id, formulas);
    }

    /// Adds or replaces one definition in an existing publisher's set.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownPublisher`] if the publisher does not exist.
    pub fn upsert_formula(&self, publisher: PublisherId, definition: FormulaDefinition) -> Result<()> {
        let mut publishers = self.publishers.write();
        let formulas = publishers
            .get_mut(&publisher)
            .ok_or_else(|| Error::new(ErrorKind::UnknownPublisher(publisher)))?;
        match formulas.iter_mut().find(|d| d.key == definition.key) {
            Some(existing) => *existing = definition,
            None => formulas.push(definition),
        }
        Ok(())
    }
}

impl LocationProvider for InMemoryDirectory {
    fn location(&self, publisher: PublisherId, locality: LocalityId) -> Result<Location> {
        if let Some(location) = self.overrides.read().get(&(publisher, locality)) {
            return Ok(location.clone());
        }
        self.localities
            .read()
            .get(&locality)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnknownLocality(locality)))
    }
}

impl FormulaSource for InMemoryDirectory {
    fn formulas(&self, publisher: PublisherId) -> Result<Vec<FormulaDefinition>> {
        self.publishers
            .read()
            .get(&publisher)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnknownPublisher(publisher)))
    }
}

/// A calendar that answers from a fixed table of dates.
///
/// Dates not in the table have no active events.
#[derive(Clone, Debug, Default)]
pub struct StaticCalendar {
    days: HashMap<NaiveDate, ActiveEvents>,
}

impl StaticCalendar {
    /// Creates a calendar with no events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the events of one date.
    #[must_use]
    pub fn with_day<S: Into<String>>(
        mut self,
        date: NaiveDate,
        codes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.set_day(date, codes);
        self
    }

    /// Sets the events of one date.
    pub fn set_day<S: Into<String>>(&mut self, date: NaiveDate, codes: impl IntoIterator<Item = S>) {
        self.days.insert(date, codes.into_iter().collect());
    }
}

impl CalendarProvider for StaticCalendar {
    fn active_events(&self, date: NaiveDate, _location: &Location) -> ActiveEvents {
        self.days.get(&date).cloned().unwrap_or_default()
    }
}
