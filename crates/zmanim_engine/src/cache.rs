//! Result cache for day calculations.
//!
//! A [`CacheKey`] carries every input that changes a day's output:
//! publisher, locality, date, request flag bits and the sorted active event
//! codes. Entries are stored as MessagePack bytes so a hit hands out a fresh
//! [`DayResult`] and never shares mutable state with the caller.
//!
//! Entries are bucketed per publisher, which makes
//! [`ResultCache::invalidate_publisher`] a single map removal. Expired
//! entries are dropped when a read finds them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::RwLock;
use zmanim_foundation::{
    ActiveEvents, CalcFlags, DayResult, Error, ErrorKind, LocalityId, PublisherId, Result,
};

/// Identifies one cached day result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The publisher whose formulas were used.
    pub publisher: PublisherId,
    /// The locality calculated for.
    pub locality: LocalityId,
    /// The calendar date.
    pub date: NaiveDate,
    /// [`CalcFlags::bits`] of the request.
    pub flag_bits: u8,
    /// Active event codes, sorted.
    pub events: Vec<String>,
}

impl CacheKey {
    /// Builds the key for one day's request.
    #[must_use]
    pub fn new(
        publisher: PublisherId,
        locality: LocalityId,
        date: NaiveDate,
        flags: CalcFlags,
        events: &ActiveEvents,
    ) -> Self {
        Self {
            publisher,
            locality,
            date,
            flag_bits: flags.bits(),
            events: events.sorted_codes(),
        }
    }
}

/// Hit and miss counts since the cache was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a live entry.
    pub hits: u64,
    /// Reads that found nothing, or an expired entry.
    pub misses: u64,
    /// Live and expired entries currently stored.
    pub entries: usize,
}

#[derive(Debug)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Day results by [`CacheKey`], with a fixed time to live.
#[derive(Debug)]
pub struct ResultCache {
    buckets: RwLock<HashMap<PublisherId, HashMap<CacheKey, Entry>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The time to live of new entries.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached result for `key`, marked `from_cache`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Serialization`] if the stored bytes do not decode.
    pub fn get(&self, key: &CacheKey) -> Result<Option<DayResult>> {
        let now = Instant::now();
        let lookup = self
            .buckets
            .read()
            .get(&key.publisher)
            .and_then(|bucket| bucket.get(key))
            .map(|entry| {
                (entry.expires_at > now).then(|| rmp_serde::from_slice::<DayResult>(&entry.bytes))
            });
        let found = match lookup {
            Some(Some(decoded)) => Some(decoded),
            Some(None) => {
                self.remove_expired(key, now);
                None
            }
            None => None,
        };

        match found {
            Some(decoded) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(date = %key.date, publisher = %key.publisher, "result cache hit");
                let mut day =
                    decoded.map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
                day.from_cache = true;
                Ok(Some(day))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(date = %key.date, publisher = %key.publisher, "result cache miss");
                Ok(None)
            }
        }
    }

    /// Stores `day` under `key`, replacing any previous entry.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Serialization`] if `day` does not encode.
    pub fn put(&self, key: CacheKey, day: &DayResult) -> Result<()> {
        let bytes = rmp_serde::to_vec_named(day)
            .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
        let entry = Entry {
            bytes,
            expires_at: Instant::now() + self.ttl,
        };
        self.buckets
            .write()
            .entry(key.publisher)
            .or_default()
            .insert(key, entry);
        Ok(())
    }

    /// Drops every entry for `publisher`. Returns how many were dropped.
    pub fn invalidate_publisher(&self, publisher: PublisherId) -> usize {
        let removed = self
            .buckets
            .write()
            .remove(&publisher)
            .map_or(0, |bucket| bucket.len());
        tracing::info!(%publisher, removed, "invalidated publisher results");
        removed
    }

    /// Drops every entry for `locality` within `publisher`.
    pub fn invalidate_locality(&self, publisher: PublisherId, locality: LocalityId) -> usize {
        let mut buckets = self.buckets.write();
        let Some(bucket) = buckets.get_mut(&publisher) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|key, _| key.locality != locality);
        let removed = before - bucket.len();
        if bucket.is_empty() {
            buckets.remove(&publisher);
        }
        tracing::info!(%publisher, %locality, removed, "invalidated locality results");
        removed
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.write();
        let mut removed = 0;
        for bucket in buckets.values_mut() {
            let before = bucket.len();
            bucket.retain(|_, entry| entry.expires_at > now);
            removed += before - bucket.len();
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.buckets.write().clear();
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(HashMap::len).sum()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current hit and miss counts.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn remove_expired(&self, key: &CacheKey, now: Instant) {
        let mut buckets = self.buckets.write();
        if let Some(bucket) = buckets.get_mut(&key.publisher) {
            // Another writer may have refreshed the entry since the read.
            if bucket.get(key).is_some_and(|e| e.expires_at <= now) {
                bucket.remove(key);
            }
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_TTL)
    }
}
