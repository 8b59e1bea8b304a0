use serde::{Deserialize, Serialize};

use crate::identity::DeviceAddress;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Static (mock) device
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A fixed device address used instead of the platform's address
/// capability.  Intended for local development and the CLI.
///
/// When `mock` is true, persistence saves are also skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub mock: bool,
    #[serde(default = "d_device_id")]
    pub device_id: String,
    #[serde(default = "d_address")]
    pub address: DeviceAddress,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mock: false,
            device_id: d_device_id(),
            address: d_address(),
        }
    }
}

fn d_device_id() -> String {
    "mock-device".into()
}

fn d_address() -> DeviceAddress {
    DeviceAddress {
        address_line1: Some("241 No Such Street".into()),
        postal_code: Some("CB24 6ZD".into()),
        country_code: Some("GB".into()),
    }
}
