//! The `ScheduleProvider` trait defines the interface for every source of
//! collection schedules (REST, cached, test doubles).

use async_trait::async_trait;
use bc_domain::error::Result;
use bc_domain::CollectionEvent;

use crate::types::LocationDto;

/// Abstraction over the council waste-calendar API.
///
/// Each call is independently fallible.  Network failures come back as
/// `Error::Http` / `Error::Timeout`; an empty result is `Ok(vec![])`.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// All registered locations sharing a postcode
    /// (GET /address/search/?postCode={code}).
    async fn search_locations(&self, postcode: &str) -> Result<Vec<LocationDto>>;

    /// The next `count` collections for one location, date ascending
    /// (GET /collection/search/{locationId}/?numberOfCollections={n}).
    async fn collections_for(&self, location_id: &str, count: u32) -> Result<Vec<CollectionEvent>>;

    /// [`search_locations`](Self::search_locations), skipping any
    /// process-local memo.
    async fn search_locations_uncached(&self, postcode: &str) -> Result<Vec<LocationDto>> {
        self.search_locations(postcode).await
    }

    /// [`collections_for`](Self::collections_for), skipping any
    /// process-local memo.
    async fn collections_for_uncached(
        &self,
        location_id: &str,
        count: u32,
    ) -> Result<Vec<CollectionEvent>> {
        self.collections_for(location_id, count).await
    }
}
