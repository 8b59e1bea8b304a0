//! Cache freshness: when to trust the cached schedule and when to re-fetch.
//!
//! Evaluated at the start of every turn.  The checks run in a fixed order
//! and the first one that fires decides; none of them mutate the state.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use bc_domain::config::{CacheConfig, Config};
use bc_domain::day::start_of_day;
use bc_domain::{CachedState, DeviceIdentity, LocationKey};

/// Reason a cached schedule must be refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    NoCollections,
    NoDevice,
    DifferentPlace,
    AllLapsed,
    NeverFetched,
    TooOld { age_secs: i64 },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCollections => write!(f, "no cached collections"),
            Self::NoDevice => write!(f, "no device identity on cached state"),
            Self::DifferentPlace => write!(f, "device is at a different location"),
            Self::AllLapsed => write!(f, "every cached collection is before today"),
            Self::NeverFetched => write!(f, "fetch time unknown"),
            Self::TooOld { age_secs } => write!(f, "cache too old ({age_secs}s)"),
        }
    }
}

/// Decides whether a cached state can be reused.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    max_age: chrono::Duration,
    postcode_max_age: chrono::Duration,
    background_after: chrono::Duration,
    tz: Tz,
}

impl FreshnessPolicy {
    pub fn new(cache: &CacheConfig, tz: Tz) -> Self {
        Self {
            max_age: cache.collections_max_age(),
            postcode_max_age: cache.postcode_max_age(),
            background_after: cache.background_refresh_after(),
            tz,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.cache, cfg.locale.timezone)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Evaluate the cached state against the current device.  Returns
    /// `Some(reason)` if a refresh is needed.
    pub fn check(
        &self,
        state: &CachedState,
        current: &DeviceIdentity,
        now: DateTime<Utc>,
    ) -> Option<StaleReason> {
        if !state.has_collections() {
            return Some(StaleReason::NoCollections);
        }

        let Some(cached_device) = &state.device else {
            return Some(StaleReason::NoDevice);
        };

        if current.location != cached_device.location {
            return Some(StaleReason::DifferentPlace);
        }

        // A past first event followed by future ones is normal; only a
        // schedule with nothing left from today onwards has lapsed.
        let midnight = start_of_day(now, self.tz);
        if state.collections.iter().all(|e| e.instant() < midnight) {
            return Some(StaleReason::AllLapsed);
        }

        let Some(fetched_at) = state.fetched_at else {
            return Some(StaleReason::NeverFetched);
        };
        let age = now.signed_duration_since(fetched_at);
        if age > self.max_age {
            return Some(StaleReason::TooOld {
                age_secs: age.num_seconds(),
            });
        }

        None
    }

    pub fn is_stale(&self, state: &CachedState, current: &DeviceIdentity, now: DateTime<Utc>) -> bool {
        self.check(state, current, now).is_some()
    }

    /// Whether the cached postcode → location lookup must be repeated for
    /// `location`.
    pub fn should_refresh_postcode(
        &self,
        state: &CachedState,
        location: &LocationKey,
        now: DateTime<Utc>,
    ) -> bool {
        match &state.postcode_cache {
            None => true,
            Some(lookup) => {
                lookup.location != *location
                    || lookup.location_ids.is_empty()
                    || now.signed_duration_since(lookup.fetched_at) > self.postcode_max_age
            }
        }
    }

    /// A fresh schedule that is getting old enough to refresh once the
    /// current answer has been sent.
    pub fn should_refresh_in_background(&self, state: &CachedState, now: DateTime<Utc>) -> bool {
        state
            .fetched_at
            .is_some_and(|at| now.signed_duration_since(at) > self.background_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_domain::{Category, CollectionEvent, PostcodeLookup};
    use chrono::{Duration, TimeZone};

    fn policy() -> FreshnessPolicy {
        FreshnessPolicy::new(&CacheConfig::default(), chrono_tz::Europe::London)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn identity(device: &str, building: &str) -> DeviceIdentity {
        DeviceIdentity::new(device, LocationKey::new("TE5 7PC", Some(building)))
    }

    fn event(days_from_now: i64) -> CollectionEvent {
        let day = start_of_day(now(), chrono_tz::Europe::London) + Duration::days(days_from_now);
        CollectionEvent::new(day, vec![Category::Domestic], false).unwrap()
    }

    fn state(events: Vec<CollectionEvent>, fetched_ago: Duration) -> CachedState {
        CachedState::fetched(events, identity("dev-1", "42"), None, now() - fetched_ago)
    }

    #[test]
    fn fresh_state_is_reused() {
        let s = state(vec![event(1), event(8)], Duration::hours(1));
        assert_eq!(policy().check(&s, &identity("dev-1", "42"), now()), None);
    }

    #[test]
    fn empty_collections_are_stale() {
        let s = state(vec![], Duration::hours(1));
        assert_eq!(
            policy().check(&s, &identity("dev-1", "42"), now()),
            Some(StaleReason::NoCollections)
        );
    }

    #[test]
    fn missing_device_is_stale() {
        let mut s = state(vec![event(1)], Duration::hours(1));
        s.device = None;
        assert_eq!(
            policy().check(&s, &identity("dev-1", "42"), now()),
            Some(StaleReason::NoDevice)
        );
    }

    #[test]
    fn moved_device_is_stale() {
        let s = state(vec![event(1)], Duration::hours(1));
        assert_eq!(
            policy().check(&s, &identity("dev-1", "44"), now()),
            Some(StaleReason::DifferentPlace)
        );
    }

    #[test]
    fn other_device_same_place_reuses_cache() {
        let s = state(vec![event(1)], Duration::hours(1));
        assert!(!policy().is_stale(&s, &identity("dev-2", "42"), now()));
    }

    #[test]
    fn event_at_midnight_today_is_not_lapsed() {
        let s = state(vec![event(-7), event(0)], Duration::hours(1));
        assert!(!policy().is_stale(&s, &identity("dev-1", "42"), now()));
    }

    #[test]
    fn missing_fetch_time_is_stale() {
        let mut s = state(vec![event(1)], Duration::hours(1));
        s.fetched_at = None;
        assert_eq!(
            policy().check(&s, &identity("dev-1", "42"), now()),
            Some(StaleReason::NeverFetched)
        );
    }

    #[test]
    fn postcode_cache_rules() {
        let p = policy();
        let here = LocationKey::new("TE5 7PC", Some("42"));
        let mut s = state(vec![event(1)], Duration::hours(1));
        assert!(p.should_refresh_postcode(&s, &here, now()));

        s.postcode_cache = Some(PostcodeLookup {
            location: here.clone(),
            location_ids: vec!["1".into()],
            fetched_at: now() - Duration::days(3),
        });
        assert!(!p.should_refresh_postcode(&s, &here, now()));
        assert!(p.should_refresh_postcode(&s, &LocationKey::new("TE5 7PC", Some("40")), now()));
        assert!(p.should_refresh_postcode(&s, &here, now() + Duration::days(5)));
    }

    #[test]
    fn background_refresh_after_half_a_day() {
        let p = policy();
        assert!(!p.should_refresh_in_background(&state(vec![event(1)], Duration::hours(11)), now()));
        assert!(p.should_refresh_in_background(&state(vec![event(1)], Duration::hours(13)), now()));
    }
}
