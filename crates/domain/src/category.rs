//! Waste collection categories ("round types") and their display metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MEDIA_BASE_URL: &str = "https://www.scambs.gov.uk/media/";

/// A waste stream collected by the council.
///
/// The wire form is the upstream round-type tag (`RECYCLE`, `DOMESTIC`, ...).
/// Parsing an unregistered tag fails with [`Error::UnknownCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Recycle,
    Domestic,
    Organic,
    Food,
}

/// Static display metadata for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub colour: &'static str,
    pub name: &'static str,
    pub small_image: Option<&'static str>,
    pub large_image: Option<&'static str>,
}

static RECYCLE: CategoryInfo = CategoryInfo {
    colour: "blue",
    name: "recycling",
    small_image: Some("1123/blue_bin_clipart.png"),
    large_image: Some("1123/blue_bin_clipart.png"),
};

static DOMESTIC: CategoryInfo = CategoryInfo {
    colour: "black",
    name: "landfill",
    small_image: Some("1122/black_bin.png"),
    large_image: Some("1122/black_bin.png"),
};

static ORGANIC: CategoryInfo = CategoryInfo {
    colour: "green",
    name: "compostable",
    small_image: Some("1118/green_bin.png"),
    large_image: Some("1118/green_bin.png"),
};

static FOOD: CategoryInfo = CategoryInfo {
    colour: "grey",
    name: "food waste",
    small_image: None,
    large_image: None,
};

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Recycle,
        Category::Domestic,
        Category::Organic,
        Category::Food,
    ];

    /// The upstream round-type tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Recycle => "RECYCLE",
            Self::Domestic => "DOMESTIC",
            Self::Organic => "ORGANIC",
            Self::Food => "FOOD",
        }
    }

    pub fn info(self) -> &'static CategoryInfo {
        match self {
            Self::Recycle => &RECYCLE,
            Self::Domestic => &DOMESTIC,
            Self::Organic => &ORGANIC,
            Self::Food => &FOOD,
        }
    }

    pub fn colour(self) -> &'static str {
        self.info().colour
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn small_image_url(self) -> Option<String> {
        self.info().small_image.map(|p| format!("{MEDIA_BASE_URL}{p}"))
    }

    pub fn large_image_url(self) -> Option<String> {
        self.info().large_image.map(|p| format!("{MEDIA_BASE_URL}{p}"))
    }

    /// Resolve a user-supplied slot value to a category.
    ///
    /// Accepts the tag, the colour, or the friendly name, case-insensitively
    /// (`"blue"`, `"recycling"`, `"RECYCLE"` all resolve to `Recycle`).
    pub fn resolve_slot(value: &str) -> Result<Self> {
        let v = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.tag().eq_ignore_ascii_case(v)
                    || c.colour().eq_ignore_ascii_case(v)
                    || c.name().eq_ignore_ascii_case(v)
            })
            .ok_or_else(|| Error::UnknownCategory(v.to_owned()))
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.tag() == s)
            .ok_or_else(|| Error::UnknownCategory(s.to_owned()))
    }
}

impl TryFrom<String> for Category {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.tag().to_owned()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Join the colours of `categories` for display: `"blue bin"`,
/// `"black, blue and green bins"`.
pub fn colours_label(categories: &[Category]) -> String {
    let colours: Vec<&str> = categories.iter().map(|c| c.colour()).collect();
    match colours.as_slice() {
        [] => String::new(),
        [one] => format!("{one} bin"),
        [init @ .., last] => format!("{} and {last} bins", init.join(", ")),
    }
}
