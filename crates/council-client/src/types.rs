//! Data Transfer Objects matching the council waste-calendar API.
//!
//! Field names use `camelCase` on the wire and `snake_case` in Rust code.
//! Identifiers arrive as either JSON strings or numbers depending on the
//! record; both are accepted and kept as strings.

use bc_domain::error::Result;
use bc_domain::CollectionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Address search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// GET /address/search/?postCode={code}: one element of the response array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub house_number: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
}

impl LocationDto {
    /// Whether this record's house number matches a device's building token.
    pub fn matches_building(&self, building: &str) -> bool {
        self.house_number
            .as_deref()
            .is_some_and(|h| h.trim().eq_ignore_ascii_case(building))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Collection search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// GET /collection/search/{locationId}/?numberOfCollections={n}: response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSearchResponse {
    #[serde(default)]
    pub collections: Vec<CollectionDto>,
}

/// One upcoming collection as the council reports it.
///
/// `round_types` stays as raw tags here so an unknown tag surfaces as a
/// typed domain error at conversion time instead of a generic JSON error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDto {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub round_types: Vec<String>,
    #[serde(default)]
    pub slipped_collection: bool,
}

impl CollectionDto {
    pub fn into_event(self) -> Result<CollectionEvent> {
        CollectionEvent::from_tags(self.date, &self.round_types, self.slipped_collection)
    }
}

impl CollectionSearchResponse {
    /// Convert every collection, in upstream order.  The first unknown
    /// category fails the whole response.
    pub fn into_events(self) -> Result<Vec<CollectionEvent>> {
        self.collections
            .into_iter()
            .map(CollectionDto::into_event)
            .collect()
    }
}

// ── serde helpers ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    S(String),
    N(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::S(s) => s,
            StringOrNumber::N(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(Into::into)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(d).map(|o| o.map(Into::into))
}
