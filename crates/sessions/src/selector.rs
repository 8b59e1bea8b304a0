//! Next-collection search over a cached schedule.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use bc_domain::day::start_of_day;
use bc_domain::{CachedState, Category, CollectionEvent};

/// The first collection, in schedule order, that is on or after
/// `start_of_today`, strictly after the state's watermark, and (if a
/// filter is given) includes `category`.
///
/// Never re-sorts and never relaxes the watermark: `None` means "not
/// known yet", not an error.
pub fn next_event(
    state: &CachedState,
    category: Option<Category>,
    start_of_today: DateTime<Utc>,
) -> Option<&CollectionEvent> {
    state.collections.iter().find(|e| {
        let at = e.instant();
        at >= start_of_today
            && at > state.last_reported
            && category.map_or(true, |c| e.has_category(c))
    })
}

/// [`next_event`] with "today" taken from `now` in `tz`.
pub fn next_event_at(
    state: &CachedState,
    category: Option<Category>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Option<&CollectionEvent> {
    next_event(state, category, start_of_day(now, tz))
}
