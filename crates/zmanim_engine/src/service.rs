//! The calculation service: one publisher's zmanim for one date.
//!
//! A day is computed in a fixed order:
//!
//! 1. Resolve the effective location and the publisher's definitions
//!    (or take them preloaded, as the range calculator does).
//! 2. Drop definitions the request flags exclude.
//! 3. Build one [`FormulaTable`] and one [`EvaluationContext`] for the day.
//! 4. Evaluate every definition that passes the tag filter, or all of them
//!    with `include_inactive`.
//! 5. Assemble the results in display order.
//!
//! Definitions removed by the tag filter stay in the formula table, so a
//! shown formula may still reference them. Disabled definitions do not.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use zmanim_foundation::{
    ActiveEvents, CalcFlags, CalculatedZman, DayResult, Diagnostic, Error, FormulaDefinition,
    LocalityId, Location, PublisherId, Result, RoundingMode, Value,
};
use zmanim_language::{BreakdownStep, EvaluationContext, FormulaTable, parse_cached};

use crate::cache::{CacheKey, ResultCache};
use crate::collaborators::{CalendarProvider, FormulaSource, InMemoryDirectory, LocationProvider};
use crate::config::EngineConfig;
use crate::filter::{passes_flags, should_show};
use crate::rounding::apply_rounding;

// =============================================================================
// Requests
// =============================================================================

/// A request for one publisher's zmanim on one date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalculationRequest {
    /// Whose formulas to use.
    pub publisher: PublisherId,
    /// Where to calculate.
    pub locality: LocalityId,
    /// The local calendar date.
    pub date: NaiveDate,
    /// Which hidden formulas to include.
    pub flags: CalcFlags,
    /// Active event codes. `None` asks the calendar provider.
    pub events: Option<ActiveEvents>,
    /// Skip the result cache for both reading and writing.
    pub bypass_cache: bool,
}

impl CalculationRequest {
    /// Creates a request with default flags.
    #[must_use]
    pub const fn new(publisher: PublisherId, locality: LocalityId, date: NaiveDate) -> Self {
        Self {
            publisher,
            locality,
            date,
            flags: CalcFlags {
                include_disabled: false,
                include_unpublished: false,
                include_beta: false,
                include_inactive: false,
            },
            events: None,
            bypass_cache: false,
        }
    }

    /// Builder method to set the flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: CalcFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder method to supply the active event codes.
    #[must_use]
    pub fn with_events(mut self, events: ActiveEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Builder method to skip the result cache.
    #[must_use]
    pub const fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}

/// An ad-hoc formula evaluated with its breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaPreview {
    /// The formula's value.
    pub value: Value,
    /// The instant in the location's local time, if the value is one.
    pub instant: Option<DateTime<FixedOffset>>,
    /// Exact local time, `HH:MM:SS`.
    pub time_exact: Option<String>,
    /// Local time rounded to the minute.
    pub time_rounded: Option<String>,
    /// Each primitive, function call and reference with its value.
    pub breakdown: Vec<BreakdownStep>,
    /// Why there is no instant, or a warning about how it was computed.
    pub diagnostic: Option<Diagnostic>,
}

// =============================================================================
// Service
// =============================================================================

/// Calculates day results and owns the result cache.
pub struct CalculationService {
    config: EngineConfig,
    locations: Arc<dyn LocationProvider>,
    formulas: Arc<dyn FormulaSource>,
    calendar: Arc<dyn CalendarProvider>,
    cache: ResultCache,
}

impl CalculationService {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        locations: Arc<dyn LocationProvider>,
        formulas: Arc<dyn FormulaSource>,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Self {
        let cache = ResultCache::new(config.cache_ttl);
        Self {
            config,
            locations,
            formulas,
            calendar,
            cache,
        }
    }

    /// Creates a service whose localities and formulas come from `directory`.
    #[must_use]
    pub fn with_directory(
        config: EngineConfig,
        directory: Arc<InMemoryDirectory>,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self::new(config, directory.clone(), directory, calendar)
    }

    /// The service configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The result cache.
    #[must_use]
    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub(crate) fn locations(&self) -> &dyn LocationProvider {
        self.locations.as_ref()
    }

    pub(crate) fn formula_source(&self) -> &dyn FormulaSource {
        self.formulas.as_ref()
    }

    pub(crate) fn calendar(&self) -> &dyn CalendarProvider {
        self.calendar.as_ref()
    }

    /// Calculates one day.
    ///
    /// # Errors
    /// Returns [`zmanim_foundation::ErrorKind::UnknownPublisher`] or
    /// [`zmanim_foundation::ErrorKind::UnknownLocality`] before any work is
    /// done, or [`zmanim_foundation::ErrorKind::InvalidArgument`] if two
    /// included definitions share a key.
    pub fn calculate(&self, request: &CalculationRequest) -> Result<DayResult> {
        let location = self.locations.location(request.publisher, request.locality)?;
        let definitions = self.formulas.formulas(request.publisher)?;
        self.calculate_with(request, &location, &definitions)
    }

    /// Calculates one day with the location and definitions already loaded.
    ///
    /// Formula failures never fail the day; they are reported on the
    /// affected entries. The result is cached under the request's publisher
    /// and locality, so `location` and `definitions` must be the ones those
    /// ids resolve to.
    ///
    /// # Errors
    /// Returns [`zmanim_foundation::ErrorKind::InvalidArgument`] if two
    /// included definitions share a key.
    pub(crate) fn calculate_with(
        &self,
        request: &CalculationRequest,
        location: &Location,
        definitions: &[FormulaDefinition],
    ) -> Result<DayResult> {
        let events = match &request.events {
            Some(events) => events.clone(),
            None => self.calendar.active_events(request.date, location),
        };

        let use_cache = self.config.cache_enabled && !request.bypass_cache;
        let key = CacheKey::new(
            request.publisher,
            request.locality,
            request.date,
            request.flags,
            &events,
        );
        if use_cache {
            match self.cache.get(&key) {
                Ok(Some(day)) => return Ok(day),
                Ok(None) => {}
                Err(err) => tracing::warn!(date = %request.date, error = %err, "discarding unreadable cache entry"),
            }
        }

        let day = self.compute_day(request.date, location, &events, definitions, request.flags)?;

        if use_cache {
            if let Err(err) = self.cache.put(key, &day) {
                tracing::warn!(date = %request.date, error = %err, "failed to cache day result");
            }
        }
        Ok(day)
    }

    /// Evaluates `text` on `date` at `location` and records its breakdown.
    ///
    /// `references` supplies the formulas `@key` may name; without it every
    /// reference is undefined.
    ///
    /// # Errors
    /// Returns the parse error if `text` is not a valid formula.
    pub fn preview_formula(
        &self,
        text: &str,
        location: &Location,
        date: NaiveDate,
        events: &ActiveEvents,
        references: Option<&[FormulaDefinition]>,
    ) -> Result<FormulaPreview> {
        let expr = parse_cached(text)?;
        let mut table = FormulaTable::new();
        for definition in references.unwrap_or_default() {
            table.insert_text(definition.key.clone(), &definition.formula);
        }

        let mut ctx = EvaluationContext::new(date, location, events, &table)
            .with_strict_references(self.config.strict_references)
            .with_breakdown();
        let evaluation = ctx.evaluate(&expr);
        let breakdown = ctx.take_breakdown();

        let diagnostic = evaluation
            .diagnostic("formula")
            .or_else(|| evaluation.warnings.first().cloned());
        let instant = evaluation
            .instant()
            .map(|t| t.with_timezone(&location.timezone).fixed_offset());
        let (time_exact, time_rounded) = match instant {
            Some(t) => {
                let (exact, rounded) = apply_rounding(t, RoundingMode::default());
                (Some(exact), Some(rounded))
            }
            None => (None, None),
        };
        let value = match evaluation.value {
            Ok(value) => value,
            Err(_) => Value::Null,
        };

        Ok(FormulaPreview {
            value,
            instant,
            time_exact,
            time_rounded,
            breakdown,
            diagnostic,
        })
    }

    /// Drops every cached result for `publisher`.
    ///
    /// Call after any edit to the publisher's formulas, tags or location
    /// overrides.
    pub fn invalidate_publisher(&self, publisher: PublisherId) -> usize {
        self.cache.invalidate_publisher(publisher)
    }

    /// Drops cached results for one locality of `publisher`.
    pub fn invalidate_locality(&self, publisher: PublisherId, locality: LocalityId) -> usize {
        self.cache.invalidate_locality(publisher, locality)
    }

    fn compute_day(
        &self,
        date: NaiveDate,
        location: &Location,
        events: &ActiveEvents,
        definitions: &[FormulaDefinition],
        flags: CalcFlags,
    ) -> Result<DayResult> {
        let mut included: Vec<&FormulaDefinition> = definitions
            .iter()
            .filter(|d| passes_flags(d, flags))
            .collect();

        let mut table = FormulaTable::new();
        for definition in &included {
            if table.contains(&definition.key) {
                return Err(Error::invalid_argument(format!(
                    "duplicate formula key '{}'",
                    definition.key
                )));
            }
            table.insert_text(definition.key.clone(), &definition.formula);
        }

        included.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut ctx = EvaluationContext::new(date, location, events, &table)
            .with_strict_references(self.config.strict_references);
        let mut zmanim = Vec::with_capacity(included.len());
        for definition in included {
            let active = should_show(&definition.tags, events);
            if !active && !flags.include_inactive {
                continue;
            }
            zmanim.push(self.evaluate_definition(&mut ctx, definition, active, location.timezone));
        }
        Ok(DayResult::new(date, zmanim))
    }

    fn evaluate_definition(
        &self,
        ctx: &mut EvaluationContext<'_>,
        definition: &FormulaDefinition,
        active: bool,
        timezone: Tz,
    ) -> CalculatedZman {
        let key = definition.key.as_str();
        let evaluation = ctx.evaluate_key(key);
        let diagnostic = evaluation
            .diagnostic(key)
            .or_else(|| evaluation.warnings.first().cloned());
        if let Some(diagnostic) = &diagnostic {
            tracing::warn!(key, date = %ctx.date(), %diagnostic, "formula degraded");
        }

        let instant = evaluation
            .instant()
            .map(|t| t.with_timezone(&timezone).fixed_offset());
        let (time_exact, time_rounded) = match instant {
            Some(t) => {
                let (exact, rounded) = apply_rounding(t, definition.rounding);
                (Some(exact), self.config.rounding_enabled.then_some(rounded))
            }
            None => (None, None),
        };

        CalculatedZman {
            key: definition.key.clone(),
            instant,
            time_exact,
            time_rounded,
            rounding: definition.rounding,
            is_active_today: active,
            diagnostic,
        }
    }
}

impl std::fmt::Debug for CalculationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationService")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

/// A day whose calculation failed as a whole: every definition the day
/// would have shown, with no value and the same diagnostic.
///
/// Flag and tag filtering apply as for a computed day, so a failed day
/// lists the same keys in the same order.
pub(crate) fn failed_day(
    date: NaiveDate,
    definitions: &[FormulaDefinition],
    events: &ActiveEvents,
    flags: CalcFlags,
    err: &Error,
) -> DayResult {
    let diagnostic = Diagnostic::from(err);
    let mut shown: Vec<(&FormulaDefinition, bool)> = definitions
        .iter()
        .filter(|d| passes_flags(d, flags))
        .map(|d| (d, should_show(&d.tags, events)))
        .filter(|(_, active)| *active || flags.include_inactive)
        .collect();
    shown.sort_by(|(a, _), (b, _)| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.key.cmp(&b.key))
    });
    let zmanim = shown
        .into_iter()
        .map(|(d, active)| {
            let mut zman = CalculatedZman::failed(d.key.clone(), diagnostic.clone());
            zman.rounding = d.rounding;
            zman.is_active_today = active;
            zman
        })
        .collect();
    DayResult::new(date, zmanim)
}
