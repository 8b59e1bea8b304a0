mod common;

use bc_domain::{CachedState, Category};
use bc_sessions::{next_event, next_event_at};

use common::{event, midnight, now, TZ};

#[test]
fn watermark_walks_through_schedule() {
    let mut state = CachedState {
        collections: vec![
            event(1, &[Category::Domestic]),
            event(8, &[Category::Recycle]),
            event(15, &[Category::Organic]),
        ],
        ..Default::default()
    };

    let mut seen = Vec::new();
    while let Some(e) = next_event(&state, None, midnight()).cloned() {
        seen.push(e.primary_category());
        state.last_reported = e.instant();
    }
    assert_eq!(seen, vec![Category::Domestic, Category::Recycle, Category::Organic]);
    assert!(next_event(&state, None, midnight()).is_none());
}

#[test]
fn category_filter_only_returns_matching_events() {
    let state = CachedState {
        collections: vec![
            event(1, &[Category::Domestic]),
            event(3, &[Category::Organic]),
            event(8, &[Category::Recycle, Category::Food]),
            event(15, &[Category::Domestic]),
            event(22, &[Category::Recycle]),
        ],
        ..Default::default()
    };

    let mut s = state.clone();
    let mut found = 0;
    while let Some(e) = next_event_at(&s, Some(Category::Recycle), now(), TZ).cloned() {
        assert!(e.has_category(Category::Recycle));
        s.last_reported = e.instant();
        found += 1;
    }
    assert_eq!(found, 2);
}

#[test]
fn selector_does_not_mutate_state() {
    let state = CachedState {
        collections: vec![event(1, &[Category::Domestic])],
        ..Default::default()
    };
    let before = state.clone();
    let _ = next_event(&state, Some(Category::Domestic), midnight());
    assert_eq!(state, before);
}
