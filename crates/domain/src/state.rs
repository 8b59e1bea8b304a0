//! The cached per-user state object carried in session and persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::event::CollectionEvent;
use crate::identity::{DeviceIdentity, LocationKey};

/// Postcode → upstream location candidates, cached with its own age rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcodeLookup {
    pub location: LocationKey,
    /// Candidate location IDs, best guess first.
    pub location_ids: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Everything remembered about a user between turns.
///
/// Built wholesale by the refresh pipeline; between refreshes only the
/// conversational fields (`last_reported`, `current_category`,
/// `missed_question`, `dirty`) change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedState {
    /// Upcoming collections in upstream (date ascending) order.
    #[serde(default)]
    pub collections: Vec<CollectionEvent>,
    #[serde(default, rename = "fetchedOnDate")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "alexaDevice")]
    pub device: Option<DeviceIdentity>,
    /// Events at or before this instant were already reported in the
    /// current line of questioning.
    #[serde(default = "epoch", rename = "lastReportedBinTime")]
    pub last_reported: DateTime<Utc>,
    #[serde(default, rename = "currentBinType")]
    pub current_category: Option<Category>,
    #[serde(default)]
    pub missed_question: bool,
    #[serde(default)]
    pub postcode_cache: Option<PostcodeLookup>,
    #[serde(default, rename = "areDirty")]
    pub dirty: bool,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Default for CachedState {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            fetched_at: None,
            device: None,
            last_reported: epoch(),
            current_category: None,
            missed_question: false,
            postcode_cache: None,
            dirty: false,
        }
    }
}

impl CachedState {
    /// A freshly fetched state: watermark at the epoch, marked dirty.
    pub fn fetched(
        collections: Vec<CollectionEvent>,
        device: DeviceIdentity,
        postcode_cache: Option<PostcodeLookup>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            collections,
            fetched_at: Some(now),
            device: Some(device),
            last_reported: epoch(),
            current_category: None,
            missed_question: false,
            postcode_cache,
            dirty: true,
        }
    }

    pub fn has_collections(&self) -> bool {
        !self.collections.is_empty()
    }

    /// Start a new line of questioning: nothing has been reported yet.
    pub fn reset_watermark(&mut self) {
        self.last_reported = epoch();
    }

    /// Record that `event` was just reported to the user.
    pub fn mark_reported(&mut self, event: &CollectionEvent, category: Category) {
        self.last_reported = event.instant();
        self.current_category = Some(category);
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
