//! A single scheduled collection.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::category::{colours_label, Category};
use crate::day::{CollectionDate, RelativeDay};
use crate::error::{Error, Result};

/// One collection occurrence: a date and the categories picked up that day.
///
/// Immutable once built.  `categories` is never empty; the constructor and
/// deserialization both enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub struct CollectionEvent {
    date: CollectionDate,
    categories: Vec<Category>,
    slipped: bool,
}

/// Persisted / upstream shape of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    date: DateTime<Utc>,
    round_types: Vec<Category>,
    #[serde(default)]
    slipped_collection: bool,
}

impl CollectionEvent {
    pub fn new(
        date: impl Into<CollectionDate>,
        categories: Vec<Category>,
        slipped: bool,
    ) -> Result<Self> {
        let date = date.into();
        if categories.is_empty() {
            return Err(Error::InvalidEvent(format!(
                "collection on {} has no categories",
                date.instant().to_rfc3339()
            )));
        }
        Ok(Self {
            date,
            categories,
            slipped,
        })
    }

    /// Build from upstream round-type tags, rejecting unknown tags.
    pub fn from_tags<S: AsRef<str>>(
        date: DateTime<Utc>,
        tags: &[S],
        slipped: bool,
    ) -> Result<Self> {
        let categories = tags
            .iter()
            .map(|t| t.as_ref().parse())
            .collect::<Result<Vec<Category>>>()?;
        Self::new(date, categories, slipped)
    }

    pub fn date(&self) -> CollectionDate {
        self.date
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.date.instant()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The category used for follow-up questions and display images.
    pub fn primary_category(&self) -> Category {
        self.categories[0]
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Whether this collection is off the household's usual day.
    pub fn is_slipped(&self) -> bool {
        self.slipped
    }

    pub fn colours_label(&self) -> String {
        colours_label(&self.categories)
    }

    pub fn relative_to(&self, now: DateTime<Utc>, tz: Tz) -> RelativeDay {
        self.date.relative_to(now, tz)
    }
}

impl TryFrom<RawEvent> for CollectionEvent {
    type Error = Error;

    fn try_from(raw: RawEvent) -> Result<Self> {
        Self::new(raw.date, raw.round_types, raw.slipped_collection)
    }
}

impl From<CollectionEvent> for RawEvent {
    fn from(e: CollectionEvent) -> Self {
        Self {
            date: e.date.instant(),
            round_types: e.categories,
            slipped_collection: e.slipped,
        }
    }
}
