//! AppState construction shared by `serve` and the one-shot CLI commands.

use std::sync::Arc;

use anyhow::Context;

use bc_council::create_provider;
use bc_domain::config::{Config, ConfigSeverity};
use bc_sessions::{FreshnessPolicy, JsonFileStore, MemoryStore, PersistenceStore, RefreshPipeline};

use crate::state::{AppState, LogReloadHandle};

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(
    config: Arc<Config>,
    log_reload: Option<LogReloadHandle>,
) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Upstream ─────────────────────────────────────────────────────
    let provider = create_provider(&config).context("initializing council client")?;
    let pipeline = RefreshPipeline::from_config(provider, &config);

    // ── Persistence ──────────────────────────────────────────────────
    let store: Arc<dyn PersistenceStore> = if config.device.mock {
        tracing::warn!(device_id = %config.device.device_id, "mock device: state is not persisted");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            JsonFileStore::new(&config.persistence.state_path)
                .context("initializing state store")?,
        )
    };

    let mock_address = config.device.mock.then(|| config.device.address.clone());

    Ok(AppState {
        policy: FreshnessPolicy::from_config(&config),
        config,
        store,
        pipeline,
        mock_address,
        log_reload,
    })
}
