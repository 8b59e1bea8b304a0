use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache ages
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum age of a cached collection schedule.
    #[serde(default = "d_day")]
    pub collections_max_age_secs: u64,
    /// Maximum age of a cached postcode → location lookup.
    #[serde(default = "d_week")]
    pub postcode_max_age_secs: u64,
    /// Age after which a still-fresh schedule is refreshed after the
    /// response has been sent.
    #[serde(default = "d_half_day")]
    pub background_refresh_after_secs: u64,
    /// Capacity of the process-local upstream response cache.  Zero
    /// disables it.
    #[serde(default = "d_100")]
    pub memory_cache_max_entries: usize,
    #[serde(default = "d_300")]
    pub memory_cache_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collections_max_age_secs: d_day(),
            postcode_max_age_secs: d_week(),
            background_refresh_after_secs: d_half_day(),
            memory_cache_max_entries: 100,
            memory_cache_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn collections_max_age(&self) -> chrono::Duration {
        secs(self.collections_max_age_secs)
    }

    pub fn postcode_max_age(&self) -> chrono::Duration {
        secs(self.postcode_max_age_secs)
    }

    pub fn background_refresh_after(&self) -> chrono::Duration {
        secs(self.background_refresh_after_secs)
    }

    pub fn memory_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.memory_cache_ttl_secs)
    }
}

/// Saturates at `chrono::Duration::MAX` for ages chrono cannot represent.
fn secs(s: u64) -> chrono::Duration {
    i64::try_from(s)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

// ── serde default helpers ───────────────────────────────────────────

fn d_day() -> u64 {
    24 * 60 * 60
}
fn d_week() -> u64 {
    7 * 24 * 60 * 60
}
fn d_half_day() -> u64 {
    12 * 60 * 60
}
fn d_100() -> usize {
    100
}
fn d_300() -> u64 {
    300
}
