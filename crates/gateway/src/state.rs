use std::sync::Arc;

use chrono_tz::Tz;
use tracing_subscriber::{reload, EnvFilter, Registry};

use bc_domain::config::Config;
use bc_domain::DeviceAddress;
use bc_sessions::{
    DeviceGateway, FreshnessPolicy, PersistenceStore, RefreshPipeline, SessionOrchestrator,
    StaticDevice,
};

/// Handle for swapping the log filter of a running server.
pub type LogReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Shared application state passed to all API handlers.
///
/// The orchestrator is assembled per turn because the device gateway
/// depends on what the front-end sent with the request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PersistenceStore>,
    pub pipeline: RefreshPipeline,
    pub policy: FreshnessPolicy,
    /// Set when `[device] mock = true`: every turn sees this address and
    /// nothing is persisted.
    pub mock_address: Option<DeviceAddress>,
    /// `None` when tracing was initialized without a reload layer (tests).
    pub log_reload: Option<LogReloadHandle>,
}

impl AppState {
    pub fn timezone(&self) -> Tz {
        self.policy.timezone()
    }

    /// The orchestrator for one turn.  `address` is the device address the
    /// front-end fetched from the platform, if it could.
    pub fn orchestrator(&self, address: Option<DeviceAddress>) -> SessionOrchestrator {
        let devices: Arc<dyn DeviceGateway> = match self.mock_address.clone().or(address) {
            Some(address) => Arc::new(StaticDevice::new(address)),
            None => Arc::new(StaticDevice::without_permission()),
        };
        SessionOrchestrator::new(
            self.store.clone(),
            devices,
            self.pipeline.clone(),
            self.policy.clone(),
        )
        .skip_persist(self.mock_address.is_some())
    }
}
