//! Integration tests for the result cache

use std::sync::Arc;
use std::time::Duration;

use zmanim_engine::{
    CacheKey, CacheStats, CalculationRequest, CalculationService, EngineConfig, ResultCache,
};
use zmanim_foundation::{ActiveEvents, CalcFlags, DayResult, FormulaDefinition, PublisherId};

use crate::{JERUSALEM, LAKEWOOD, PUBLISHER, calendar, date, directory, jerusalem, service, tag};

fn key(events: &[&str]) -> CacheKey {
    let events: ActiveEvents = events.iter().copied().collect();
    CacheKey::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26), CalcFlags::default(), &events)
}

fn some_day() -> DayResult {
    service(EngineConfig::uncached())
        .calculate(&CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26)))
        .unwrap()
}

// =============================================================================
// ResultCache
// =============================================================================

#[test]
fn stored_day_comes_back_marked() {
    let cache = ResultCache::default();
    let day = some_day();
    assert!(cache.get(&key(&[])).unwrap().is_none());

    cache.put(key(&[]), &day).unwrap();
    let hit = cache.get(&key(&[])).unwrap().unwrap();
    assert!(hit.from_cache);
    assert_eq!(hit.zmanim, day.zmanim);
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 1,
            misses: 1,
            entries: 1
        }
    );
}

#[test]
fn event_order_does_not_matter_but_events_do() {
    let cache = ResultCache::default();
    cache.put(key(&["chanukah", "erev_shabbos"]), &some_day()).unwrap();
    assert!(cache.get(&key(&["erev_shabbos", "chanukah"])).unwrap().is_some());
    assert!(cache.get(&key(&["erev_shabbos"])).unwrap().is_none());
}

#[test]
fn flags_separate_entries() {
    let cache = ResultCache::default();
    let events = ActiveEvents::new();
    let plain = CacheKey::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26), CalcFlags::default(), &events);
    let beta = CacheKey::new(
        PUBLISHER,
        LAKEWOOD,
        date(2025, 12, 26),
        CalcFlags {
            include_beta: true,
            ..CalcFlags::default()
        },
        &events,
    );
    assert_ne!(plain, beta);
    cache.put(plain.clone(), &some_day()).unwrap();
    assert!(cache.get(&beta).unwrap().is_none());
    assert!(cache.get(&plain).unwrap().is_some());
}

#[test]
fn zero_ttl_never_hits() {
    let cache = ResultCache::new(Duration::ZERO);
    cache.put(key(&[]), &some_day()).unwrap();
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&key(&[])).unwrap().is_none());
    assert!(cache.is_empty());
}

#[test]
fn purge_drops_only_expired() {
    let expired = ResultCache::new(Duration::ZERO);
    expired.put(key(&[]), &some_day()).unwrap();
    expired.put(key(&["shabbos"]), &some_day()).unwrap();
    assert_eq!(expired.purge_expired(), 2);
    assert!(expired.is_empty());

    let live = ResultCache::default();
    live.put(key(&[]), &some_day()).unwrap();
    assert_eq!(live.purge_expired(), 0);
    assert_eq!(live.len(), 1);
}

#[test]
fn invalidation_scopes() {
    let cache = ResultCache::default();
    let day = some_day();
    let events = ActiveEvents::new();
    for locality in [LAKEWOOD, JERUSALEM] {
        for d in 1..=3 {
            let k = CacheKey::new(PUBLISHER, locality, date(2025, 1, d), CalcFlags::default(), &events);
            cache.put(k, &day).unwrap();
        }
    }
    let other = CacheKey::new(PublisherId(2), LAKEWOOD, date(2025, 1, 1), CalcFlags::default(), &events);
    cache.put(other.clone(), &day).unwrap();
    assert_eq!(cache.len(), 7);

    assert_eq!(cache.invalidate_locality(PUBLISHER, JERUSALEM), 3);
    assert_eq!(cache.invalidate_locality(PublisherId(9), LAKEWOOD), 0);
    assert_eq!(cache.invalidate_publisher(PUBLISHER), 3);
    assert_eq!(cache.invalidate_publisher(PUBLISHER), 0);
    assert!(cache.get(&other).unwrap().is_some());

    cache.clear();
    assert!(cache.is_empty());
}

// =============================================================================
// Through the service
// =============================================================================

#[test]
fn second_calculation_is_a_hit() {
    let service = service(EngineConfig::default());
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26));
    let first = service.calculate(&request).unwrap();
    let second = service.calculate(&request).unwrap();
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.zmanim, second.zmanim);
    assert_eq!(service.cache().stats().hits, 1);
}

#[test]
fn bypass_neither_reads_nor_writes() {
    let service = service(EngineConfig::default());
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26)).bypassing_cache();
    assert!(!service.calculate(&request).unwrap().from_cache);
    assert!(!service.calculate(&request).unwrap().from_cache);
    assert!(service.cache().is_empty());
}

#[test]
fn disabled_cache_stays_empty() {
    let service = service(EngineConfig::default().with_cache_enabled(false));
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26));
    service.calculate(&request).unwrap();
    assert!(!service.calculate(&request).unwrap().from_cache);
    assert_eq!(service.cache().stats(), CacheStats::default());
}

#[test]
fn location_override_needs_invalidation() {
    let directory = directory();
    let service = CalculationService::with_directory(
        EngineConfig::default(),
        directory.clone(),
        Arc::new(calendar()),
    );
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 6, 21));
    let before = service.calculate(&request).unwrap();

    directory.set_override(PUBLISHER, LAKEWOOD, jerusalem());
    let stale = service.calculate(&request).unwrap();
    assert!(stale.from_cache);
    assert_eq!(stale.zmanim, before.zmanim);

    assert_eq!(service.invalidate_locality(PUBLISHER, LAKEWOOD), 1);
    let fresh = service.calculate(&request).unwrap();
    assert!(!fresh.from_cache);
    assert_ne!(
        fresh.get("sunrise").unwrap().time_exact,
        before.get("sunrise").unwrap().time_exact
    );
}

#[test]
fn formula_edit_after_publisher_invalidation() {
    let directory = directory();
    let service = CalculationService::with_directory(
        EngineConfig::default(),
        directory.clone(),
        Arc::new(calendar()),
    );
    let request = CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 26));
    let before = service.calculate(&request).unwrap();

    directory
        .upsert_formula(
            PUBLISHER,
            FormulaDefinition::new("candles", "sunset - 40min")
                .with_tag(tag("shabbos"))
                .with_tag(tag("timing:day_before"))
                .with_display_order(4),
        )
        .unwrap();
    service.invalidate_publisher(PUBLISHER);

    let after = service.calculate(&request).unwrap();
    let shift = after.get("candles").unwrap().instant.unwrap()
        - before.get("candles").unwrap().instant.unwrap();
    assert_eq!(shift.num_minutes(), -22);
}

#[test]
fn shabbos_and_sunday_do_not_share_an_entry() {
    let service = service(EngineConfig::default());
    let shabbos = service
        .calculate(
            &CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 27))
                .with_events(["erev_shabbos", "shabbos"].into_iter().collect()),
        )
        .unwrap();
    let sunday = service
        .calculate(
            &CalculationRequest::new(PUBLISHER, LAKEWOOD, date(2025, 12, 28))
                .with_events(ActiveEvents::new()),
        )
        .unwrap();
    assert!(!sunday.from_cache);
    assert!(shabbos.get("havdalah").is_some());
    assert!(sunday.get("havdalah").is_none());
    assert_eq!(service.cache().len(), 2);
}
