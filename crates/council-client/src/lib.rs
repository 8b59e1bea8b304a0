//! `bc-council`: client crate for the council waste-calendar API.
//!
//! Provides the [`ScheduleProvider`] trait that abstracts over the upstream
//! schedule source, a production REST implementation
//! ([`RestCouncilClient`]), typed DTOs matching the API's JSON, and an
//! optional process-local response cache ([`CachingProvider`]).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use bc_domain::config::UpstreamConfig;
//! use bc_council::{RestCouncilClient, ScheduleProvider};
//!
//! # async fn example() -> bc_domain::error::Result<()> {
//! let client = RestCouncilClient::new(&UpstreamConfig::default())?;
//! let locations = client.search_locations("CB246ZD").await?;
//! if let Some(first) = locations.first() {
//!     let events = client.collections_for(&first.id, 12).await?;
//!     println!("{} upcoming collections", events.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod provider;
pub mod rest;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use cache::{CachingProvider, MemoryCache, NoopCache, ResponseCache};
pub use provider::ScheduleProvider;
pub use rest::{from_reqwest, RestCouncilClient};
pub use types::{CollectionDto, CollectionSearchResponse, LocationDto};

use std::sync::Arc;

use bc_domain::config::Config;
use bc_domain::error::Result;

/// Build the [`ScheduleProvider`] described by the config.
///
/// The REST client is wrapped in a [`CachingProvider`] unless
/// `cache.memory_cache_max_entries` is zero.
pub fn create_provider(cfg: &Config) -> Result<Arc<dyn ScheduleProvider>> {
    let rest: Arc<dyn ScheduleProvider> = Arc::new(RestCouncilClient::new(&cfg.upstream)?);
    if cfg.cache.memory_cache_max_entries == 0 {
        tracing::info!(base_url = %cfg.upstream.base_url, "council client ready (no memory cache)");
        return Ok(rest);
    }
    tracing::info!(
        base_url = %cfg.upstream.base_url,
        max_entries = cfg.cache.memory_cache_max_entries,
        ttl_secs = cfg.cache.memory_cache_ttl_secs,
        "council client ready with memory cache"
    );
    Ok(Arc::new(CachingProvider::with_memory(
        rest,
        cfg.cache.memory_cache_max_entries,
        cfg.cache.memory_cache_ttl(),
    )))
}
