//! The voice platform's device capabilities, as seen by the core.
//!
//! The front-end implements [`DeviceGateway`] over the platform's
//! device-address and progressive-response services; [`StaticDevice`]
//! stands in for it during development and in tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use bc_domain::config::DeviceConfig;
use bc_domain::error::{Error, Result};
use bc_domain::DeviceAddress;

/// Message spoken while the schedule is being fetched.
pub const PLEASE_WAIT: &str = "Please wait while I look that up.";

#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// The device's registered address.  Fails with
    /// `Error::PermissionDenied` when the user has not granted access.
    async fn address(&self, device_id: &str, consent_token: &str) -> Result<DeviceAddress>;

    /// Speak a short progress notice on the device before the answer is
    /// ready.
    async fn notify_progress(&self, device_id: &str, message: &str) -> Result<()>;
}

/// A device with a fixed address.  Progress notices are recorded, not sent.
#[derive(Debug)]
pub struct StaticDevice {
    address: Option<DeviceAddress>,
    notices: Mutex<Vec<String>>,
}

impl StaticDevice {
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address: Some(address),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// A device whose address access was never granted.
    pub fn without_permission() -> Self {
        Self {
            address: None,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(cfg: &DeviceConfig) -> Self {
        Self::new(cfg.address.clone())
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl DeviceGateway for StaticDevice {
    async fn address(&self, device_id: &str, _consent_token: &str) -> Result<DeviceAddress> {
        self.address
            .clone()
            .ok_or_else(|| Error::PermissionDenied(format!("no address for device {device_id}")))
    }

    async fn notify_progress(&self, _device_id: &str, message: &str) -> Result<()> {
        self.notices.lock().push(message.to_owned());
        Ok(())
    }
}
