//! Process-local response cache for warm invocations.
//!
//! Upstream answers rarely change within minutes, so a short-lived cache
//! keyed by request lets consecutive turns (or several users in one
//! postcode) skip a round trip.  The cache is injected, never global, and
//! [`NoopCache`] turns it off.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bc_domain::error::Result;
use bc_domain::CollectionEvent;
use parking_lot::Mutex;

use crate::provider::ScheduleProvider;
use crate::types::LocationDto;

/// A keyed cache of cloneable values.
pub trait ResponseCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn insert(&self, key: String, value: V);
    fn clear(&self);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Entry<V> {
    value: V,
    expires: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

/// TTL cache bounded by entry count.  When full, the oldest insertion is
/// evicted; expired entries are dropped lazily on read.
pub struct MemoryCache<V> {
    inner: Mutex<Inner<V>>,
    max_entries: usize,
    ttl: Duration,
}

impl<V> MemoryCache<V> {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries,
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send> ResponseCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            None => return None,
            Some(entry) => Instant::now() >= entry.expires,
        };
        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        inner.entries.get(key).map(|e| e.value.clone())
    }

    fn insert(&self, key: String, value: V) {
        if self.max_entries == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else {
            while inner.entries.len() >= self.max_entries {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                expires: Instant::now() + self.ttl,
            },
        );
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl<V> ResponseCache<V> for NoopCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn insert(&self, _key: String, _value: V) {}

    fn clear(&self) {}
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Caching provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wraps a [`ScheduleProvider`] and memoizes non-empty successful answers.
pub struct CachingProvider {
    inner: Arc<dyn ScheduleProvider>,
    locations: Arc<dyn ResponseCache<Vec<LocationDto>>>,
    collections: Arc<dyn ResponseCache<Vec<CollectionEvent>>>,
}

impl CachingProvider {
    pub fn new(
        inner: Arc<dyn ScheduleProvider>,
        locations: Arc<dyn ResponseCache<Vec<LocationDto>>>,
        collections: Arc<dyn ResponseCache<Vec<CollectionEvent>>>,
    ) -> Self {
        Self {
            inner,
            locations,
            collections,
        }
    }

    /// Both caches bounded to `max_entries` with the same TTL.
    pub fn with_memory(inner: Arc<dyn ScheduleProvider>, max_entries: usize, ttl: Duration) -> Self {
        Self::new(
            inner,
            Arc::new(MemoryCache::new(max_entries, ttl)),
            Arc::new(MemoryCache::new(max_entries, ttl)),
        )
    }
}

#[async_trait]
impl ScheduleProvider for CachingProvider {
    async fn search_locations(&self, postcode: &str) -> Result<Vec<LocationDto>> {
        let key = format!("locations:{postcode}");
        if let Some(hit) = self.locations.get(&key) {
            tracing::debug!(%key, "memory cache hit");
            return Ok(hit);
        }
        let fresh = self.inner.search_locations(postcode).await?;
        if !fresh.is_empty() {
            self.locations.insert(key, fresh.clone());
        }
        Ok(fresh)
    }

    async fn collections_for(&self, location_id: &str, count: u32) -> Result<Vec<CollectionEvent>> {
        let key = format!("collections:{location_id}:{count}");
        if let Some(hit) = self.collections.get(&key) {
            tracing::debug!(%key, "memory cache hit");
            return Ok(hit);
        }
        let fresh = self.inner.collections_for(location_id, count).await?;
        if !fresh.is_empty() {
            self.collections.insert(key, fresh.clone());
        }
        Ok(fresh)
    }

    async fn search_locations_uncached(&self, postcode: &str) -> Result<Vec<LocationDto>> {
        let fresh = self.inner.search_locations_uncached(postcode).await?;
        if !fresh.is_empty() {
            self.locations
                .insert(format!("locations:{postcode}"), fresh.clone());
        }
        Ok(fresh)
    }

    async fn collections_for_uncached(
        &self,
        location_id: &str,
        count: u32,
    ) -> Result<Vec<CollectionEvent>> {
        let fresh = self.inner.collections_for_uncached(location_id, count).await?;
        if !fresh.is_empty() {
            self.collections
                .insert(format!("collections:{location_id}:{count}"), fresh.clone());
        }
        Ok(fresh)
    }
}
