//! Tests for the filtered views, the aggregation cache and the dashboard
//! state machine
//!
//! Only pure state is tested here; rendering and terminal handling are not.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use medcost::cli::explore::{handle_key, Control, ExploreAction, ExploreState, BMI_STEP};
use medcost::pipeline::{
    compute_view, AggregationCache, EnrichedRecord, EnrichedTable, RecordFilter, Region, Sex,
    Smoker,
};

#[path = "common/mod.rs"]
mod common;

use common::*;

fn table() -> Arc<[EnrichedRecord]> {
    Arc::from(EnrichedTable::build(&sample_records()).unwrap().rows)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

// ============================================================================
// Filters and views
// ============================================================================

#[test]
fn test_full_filter_spans_data() {
    let rows = table();
    let filter = RecordFilter::full(&rows);

    assert_eq!(filter.age, (18, 62));
    assert_eq!(filter.bmi, (17.4, 38.1));
    assert!(rows.iter().all(|r| filter.matches(&r.record)));
}

#[test]
fn test_view_of_smokers_only() {
    let rows = table();
    let mut filter = RecordFilter::full(&rows);
    filter.smokers.remove(&Smoker::No);

    let view = compute_view(&rows, &filter, None);

    assert_eq!(view.total, 8);
    assert_eq!(view.matched(), 2);
    assert_close(view.kpis.smoker_pct.unwrap(), 100.0, 1e-9);
    assert_close(
        view.kpis.mean_charges.unwrap(),
        (16884.92 + 27808.73) / 2.0,
        1e-9,
    );
    assert_eq!(view.by_smoker.len(), 1);
    // Full domain pivot: every non-smoker column is absent
    assert_eq!(view.region_smoker.rows.len(), 4);
    assert!(view
        .region_smoker
        .rows
        .iter()
        .all(|r| view.region_smoker.get(r, &Smoker::No).is_none()));
}

#[test]
fn test_empty_selection_gives_empty_kpis() {
    let rows = table();
    let mut filter = RecordFilter::full(&rows);
    filter.regions.clear();

    let view = compute_view(&rows, &filter, None);

    assert_eq!(view.matched(), 0);
    assert_eq!(view.kpis.mean_charges, None);
    assert_eq!(view.kpis.smoker_pct, None);
    assert!(view.by_region.is_empty());
}

#[test]
fn test_inclusive_ranges() {
    let rows = table();
    let mut filter = RecordFilter::full(&rows);
    filter.age = (28, 33);

    let view = compute_view(&rows, &filter, None);
    // Ages 28, 33 and 32
    assert_eq!(view.matched(), 3);
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn test_cache_memoizes_by_filter() {
    let mut cache = AggregationCache::new(table());
    let full = cache.full_filter().clone();

    let first = cache.view(&full);
    let again = cache.view(&full);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    let mut narrowed = full.clone();
    narrowed.regions.remove(&Region::Southeast);
    cache.view(&narrowed);
    assert_eq!(cache.misses(), 2);
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_cache_evicts_least_recently_used_view() {
    let mut cache = AggregationCache::with_capacity(table(), 2);
    let full = cache.full_filter().clone();
    let mut no_southeast = full.clone();
    no_southeast.regions.remove(&Region::Southeast);
    let mut smokers = full.clone();
    smokers.smokers.remove(&Smoker::No);

    let kept = cache.view(&full);
    cache.view(&no_southeast);
    cache.view(&full);
    cache.view(&smokers);

    // The southeast view was the least recently used
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&kept, &cache.view(&full)));
    cache.view(&no_southeast);
    assert_eq!((cache.hits(), cache.misses()), (2, 4));
}

#[test]
fn test_cache_capacity_is_at_least_one() {
    let mut cache = AggregationCache::with_capacity(table(), 0);
    let full = cache.full_filter().clone();
    cache.view(&full);
    cache.view(&full);
    assert_eq!(cache.capacity(), 1);
    assert_eq!(cache.hits(), 1);
}

#[test]
fn test_delta_only_when_filtered() {
    let mut cache = AggregationCache::new(table());
    let full = cache.full_filter().clone();
    assert!(cache.view(&full).delta.is_none());

    let mut smokers = full.clone();
    smokers.smokers.remove(&Smoker::No);
    let view = cache.view(&smokers);
    let delta = view.delta.as_ref().unwrap();

    let baseline = cache.baseline().mean_charges.unwrap();
    assert_close(
        delta.mean_charges.unwrap(),
        view.kpis.mean_charges.unwrap() - baseline,
        1e-9,
    );
    assert_close(delta.smoker_pct.unwrap(), 100.0 - 25.0, 1e-9);
}

#[test]
fn test_cached_view_matches_fresh_computation() {
    let rows: Arc<[EnrichedRecord]> =
        Arc::from(EnrichedTable::build(&synthetic_records(300, 17)).unwrap().rows);
    let mut cache = AggregationCache::new(Arc::clone(&rows));
    let mut filter = cache.full_filter().clone();
    filter.age = (30, 50);
    filter.bmi.1 = 35.0;

    let cached = cache.view(&filter);
    let fresh = compute_view(&rows, &filter, Some(cache.baseline()));
    assert_eq!(*cached, fresh);
}

// ============================================================================
// Dashboard state machine
// ============================================================================

#[test]
fn test_initial_state_shows_everything() {
    let state = ExploreState::new(table());
    assert_eq!(state.focused(), Control::Smoker);
    assert!(!state.is_filtered());
    assert_eq!(state.view.matched(), 8);
}

#[test]
fn test_toggle_option_refreshes_view() {
    let mut state = ExploreState::new(table());

    // Cursor starts on "no"
    assert_eq!(handle_key(&mut state, key(KeyCode::Char(' '))), ExploreAction::Refresh);
    assert!(state.is_filtered());
    assert_eq!(state.view.matched(), 2);

    // Toggling back restores the full view from the cache
    assert_eq!(handle_key(&mut state, key(KeyCode::Char(' '))), ExploreAction::Refresh);
    assert_eq!(state.view.matched(), 8);
    assert_eq!(state.cache().hits(), 1);
}

#[test]
fn test_navigation_wraps() {
    let mut state = ExploreState::new(table());
    assert_eq!(handle_key(&mut state, key(KeyCode::Up)), ExploreAction::Stay);
    assert_eq!(state.focused(), Control::BmiMax);
    handle_key(&mut state, key(KeyCode::Down));
    assert_eq!(state.focused(), Control::Smoker);
}

#[test]
fn test_option_cursor_moves_within_control() {
    let mut state = ExploreState::new(table());
    handle_key(&mut state, key(KeyCode::Down));
    assert_eq!(state.focused(), Control::Region);

    handle_key(&mut state, key(KeyCode::Left));
    assert_eq!(state.option_cursor[1], 3);
    handle_key(&mut state, key(KeyCode::Enter));
    assert!(!state.filter.regions.contains(&Region::Southwest));
    assert_eq!(state.view.matched(), 7);
}

#[test]
fn test_sliders_step_and_clamp() {
    let mut state = ExploreState::new(table());
    for _ in 0..3 {
        handle_key(&mut state, key(KeyCode::Down));
    }
    assert_eq!(state.focused(), Control::AgeMin);

    // Already at the data minimum
    assert_eq!(handle_key(&mut state, key(KeyCode::Left)), ExploreAction::Stay);
    assert_eq!(handle_key(&mut state, key(KeyCode::Right)), ExploreAction::Refresh);
    assert_eq!(state.filter.age.0, 19);
    assert_eq!(state.view.matched(), 7);

    // Age from never passes age to
    for _ in 0..100 {
        handle_key(&mut state, key(KeyCode::Right));
    }
    assert_eq!(state.filter.age.0, state.filter.age.1);

    handle_key(&mut state, key(KeyCode::Down));
    handle_key(&mut state, key(KeyCode::Down));
    assert_eq!(state.focused(), Control::BmiMin);
    handle_key(&mut state, key(KeyCode::Right));
    assert_close(state.filter.bmi.0, 17.4 + BMI_STEP, 1e-12);
}

#[test]
fn test_bmi_sliders_return_exactly_to_data_bounds() {
    let records = vec![
        record(30, Sex::Male, 15.53, 0, Smoker::No, Region::Northeast, 2000.0),
        record(40, Sex::Female, 30.0, 1, Smoker::Yes, Region::Southwest, 20000.0),
        record(50, Sex::Male, 40.17, 2, Smoker::No, Region::Southeast, 9000.0),
    ];
    let mut state = ExploreState::new(Arc::from(EnrichedTable::build(&records).unwrap().rows));
    while state.focused() != Control::BmiMin {
        handle_key(&mut state, key(KeyCode::Down));
    }

    for _ in 0..7 {
        handle_key(&mut state, key(KeyCode::Right));
    }
    for _ in 0..7 {
        handle_key(&mut state, key(KeyCode::Left));
    }
    assert_eq!(state.filter.bmi.0, 15.53);

    handle_key(&mut state, key(KeyCode::Down));
    assert_eq!(state.focused(), Control::BmiMax);
    for _ in 0..5 {
        handle_key(&mut state, key(KeyCode::Left));
    }
    for _ in 0..5 {
        handle_key(&mut state, key(KeyCode::Right));
    }
    assert_eq!(state.filter.bmi.1, 40.17);

    assert!(!state.is_filtered());
    assert_eq!(state.view.matched(), 3);
}

#[test]
fn test_reset_and_quit() {
    let mut state = ExploreState::new(table());
    handle_key(&mut state, key(KeyCode::Char(' ')));
    assert!(state.is_filtered());

    assert_eq!(handle_key(&mut state, key(KeyCode::Char('r'))), ExploreAction::Refresh);
    assert!(!state.is_filtered());
    assert_eq!(state.view.matched(), 8);

    assert_eq!(handle_key(&mut state, key(KeyCode::Esc)), ExploreAction::Quit);
    assert_eq!(handle_key(&mut state, key(KeyCode::Char('q'))), ExploreAction::Quit);
}
