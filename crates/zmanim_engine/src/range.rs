//! Range calculation: one publisher's zmanim across consecutive dates.
//!
//! Everything that does not change from day to day is loaded once: the
//! effective location, the publisher's definitions and the active event
//! codes for the whole span. Each date then takes the same per-day path as
//! [`CalculationService::calculate`], so cached days are served from the
//! result cache exactly as single-day requests are.

use chrono::NaiveDate;
use zmanim_foundation::{CalcFlags, DayResult, Error, LocalityId, PublisherId, Result};

use crate::service::{CalculationRequest, CalculationService, failed_day};

/// A request for a contiguous span of dates, both ends inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeRequest {
    /// Whose formulas to use.
    pub publisher: PublisherId,
    /// Where to calculate.
    pub locality: LocalityId,
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
    /// Which hidden formulas to include.
    pub flags: CalcFlags,
    /// Keep only this formula in each day.
    pub zman_key: Option<String>,
    /// Skip the result cache for both reading and writing.
    pub bypass_cache: bool,
}

impl RangeRequest {
    /// Creates a request for `start..=end` with default flags.
    #[must_use]
    pub fn new(
        publisher: PublisherId,
        locality: LocalityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            publisher,
            locality,
            start,
            end,
            flags: CalcFlags::default(),
            zman_key: None,
            bypass_cache: false,
        }
    }

    /// Builder method to set the flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: CalcFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder method to keep a single formula.
    #[must_use]
    pub fn with_zman_key(mut self, key: impl Into<String>) -> Self {
        self.zman_key = Some(key.into());
        self
    }

    /// Builder method to skip the result cache.
    #[must_use]
    pub const fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// Number of dates in the range, or `None` if `end` is before `start`.
    #[must_use]
    pub fn days(&self) -> Option<u32> {
        let span = (self.end - self.start).num_days();
        u32::try_from(span).ok().map(|d| d + 1)
    }
}

impl CalculationService {
    /// Calculates every date from `request.start` to `request.end`.
    ///
    /// The result has one entry per date in ascending order. A day that
    /// fails is logged and returned with every included formula empty and
    /// carrying the failure as its diagnostic.
    ///
    /// # Errors
    /// Returns [`zmanim_foundation::ErrorKind::InvalidRange`] if the range is
    /// inverted or longer than the configured maximum, and
    /// [`zmanim_foundation::ErrorKind::UnknownPublisher`] or
    /// [`zmanim_foundation::ErrorKind::UnknownLocality`] for unknown ids.
    /// All of these are raised before any day is calculated.
    pub fn calculate_range(&self, request: &RangeRequest) -> Result<Vec<DayResult>> {
        let days = self.check_range(request)?;

        let location = self.locations().location(request.publisher, request.locality)?;
        let definitions = self.formula_source().formulas(request.publisher)?;
        let mut events = self
            .calendar()
            .active_events_range(request.start, request.end, &location);
        if events.len() != days as usize {
            tracing::warn!(
                expected = days,
                returned = events.len(),
                "calendar batch does not cover the range; asking date by date"
            );
            events = request
                .start
                .iter_days()
                .take(days as usize)
                .map(|date| self.calendar().active_events(date, &location))
                .collect();
        }
        tracing::debug!(
            publisher = %request.publisher,
            locality = %request.locality,
            start = %request.start,
            days,
            "calculating range"
        );

        let mut results = Vec::with_capacity(days as usize);
        let dates = request.start.iter_days().take(days as usize);
        for (date, events) in dates.zip(events) {
            let day_request = CalculationRequest {
                publisher: request.publisher,
                locality: request.locality,
                date,
                flags: request.flags,
                events: Some(events.clone()),
                bypass_cache: request.bypass_cache,
            };
            let mut day = match self.calculate_with(&day_request, &location, &definitions) {
                Ok(day) => day,
                Err(err) => {
                    tracing::warn!(%date, error = %err, "day failed; continuing range");
                    failed_day(date, &definitions, &events, request.flags, &err)
                }
            };
            if let Some(key) = &request.zman_key {
                day.zmanim.retain(|z| &z.key == key);
            }
            results.push(day);
        }
        Ok(results)
    }

    fn check_range(&self, request: &RangeRequest) -> Result<u32> {
        let days = request
            .days()
            .ok_or_else(|| Error::invalid_range("end date must not be before start date"))?;
        let max = self.config().max_range_days;
        if days > max {
            return Err(Error::invalid_range(format!(
                "date range too large: {days} days (max {max})"
            )));
        }
        Ok(days)
    }
}
