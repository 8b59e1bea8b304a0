//! Per-turn session lifecycle.
//!
//! Before a handler runs: load the user's state (session first, then the
//! persistence store), resolve the device's location, and refresh the
//! schedule if the freshness policy says so.  After the handler: persist
//! the state if it changed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use bc_domain::error::{Error, Result};
use bc_domain::trace::TraceEvent;
use bc_domain::{CachedState, DeviceIdentity, PostcodeLookup};

use crate::device::DeviceGateway;
use crate::freshness::FreshnessPolicy;
use crate::refresh::{Fetch, ProgressTarget, RefreshPipeline};
use crate::store::PersistenceStore;

/// Who is asking, from which device.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub user_id: String,
    pub device_id: String,
    /// The platform's API access token; absent when the user never
    /// granted the skill any permissions.
    pub consent_token: Option<String>,
}

/// State ready for a handler, plus what happened while preparing it.
#[derive(Debug)]
pub struct PreparedTurn {
    pub state: CachedState,
    pub identity: DeviceIdentity,
    pub refreshed: bool,
}

pub struct SessionOrchestrator {
    store: Arc<dyn PersistenceStore>,
    devices: Arc<dyn DeviceGateway>,
    pipeline: RefreshPipeline,
    policy: FreshnessPolicy,
    /// Development mode: never write to the store.
    skip_persist: bool,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        devices: Arc<dyn DeviceGateway>,
        pipeline: RefreshPipeline,
        policy: FreshnessPolicy,
    ) -> Self {
        Self {
            store,
            devices,
            pipeline,
            policy,
            skip_persist: false,
        }
    }

    pub fn skip_persist(mut self, skip: bool) -> Self {
        self.skip_persist = skip;
        self
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    /// Resolve the device's identity through the platform.
    pub async fn identify(&self, ctx: &TurnContext) -> Result<DeviceIdentity> {
        let token = ctx
            .consent_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingConsent(format!("user {}", ctx.user_id)))?;
        let address = self.devices.address(&ctx.device_id, token).await?;
        DeviceIdentity::from_address(ctx.device_id.clone(), &address)
    }

    /// Pre-turn: produce the state the handler should answer from.
    ///
    /// `session` is the state already carried in the conversation, if any;
    /// otherwise the persisted state is loaded.
    pub async fn begin_turn(
        &self,
        ctx: &TurnContext,
        session: Option<CachedState>,
        now: DateTime<Utc>,
    ) -> Result<PreparedTurn> {
        let state = match session {
            Some(state) => state,
            None => {
                let mut loaded = match self.store.load(&ctx.user_id).await {
                    Ok(stored) => stored.unwrap_or_default(),
                    // An unreadable document is no cache at all; the
                    // refresh below overwrites it.
                    Err(Error::Json(e)) => {
                        tracing::warn!(
                            user_id = %ctx.user_id,
                            error = %e,
                            "stored state unreadable, discarding"
                        );
                        CachedState::default()
                    }
                    Err(e) => return Err(e),
                };
                // A pending follow-up question never survives a new session.
                loaded.missed_question = false;
                loaded
            }
        };

        let identity = self.identify(ctx).await?;
        let reason = self.policy.check(&state, &identity, now);

        TraceEvent::CacheDecision {
            user_id: ctx.user_id.clone(),
            stale: reason.is_some(),
            reason: reason
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "fresh".into()),
        }
        .emit();

        if reason.is_none() {
            return Ok(PreparedTurn {
                state,
                identity,
                refreshed: false,
            });
        }

        let lookup = self.reusable_lookup(&state, &identity, now);
        let fresh = self
            .pipeline
            .refresh(&identity, lookup, Some(self.progress_target(ctx)), now)
            .await?;
        Ok(PreparedTurn {
            state: fresh,
            identity,
            refreshed: true,
        })
    }

    /// Refresh regardless of freshness (the user asked for fresh data).
    ///
    /// Neither the cached postcode lookup nor the provider's memo is used.
    pub async fn force_refresh(&self, ctx: &TurnContext, now: DateTime<Utc>) -> Result<CachedState> {
        let identity = self.identify(ctx).await?;
        self.pipeline
            .refresh_with(
                &identity,
                None,
                Some(self.progress_target(ctx)),
                now,
                Fetch::Fresh,
            )
            .await
    }

    /// Refresh and persist without a waiting user.  Used after a cached
    /// answer has been sent for a schedule that is getting old.
    pub async fn refresh_in_background(
        &self,
        ctx: &TurnContext,
        identity: &DeviceIdentity,
        state: &CachedState,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let lookup = self.reusable_lookup(state, identity, now);
        let mut fresh = self.pipeline.refresh(identity, lookup, None, now).await?;
        self.end_turn(ctx, &mut fresh).await
    }

    /// Post-turn: persist the state if it has unsaved changes.
    pub async fn end_turn(&self, ctx: &TurnContext, state: &mut CachedState) -> Result<()> {
        if !state.dirty {
            return Ok(());
        }
        state.mark_clean();
        if !self.skip_persist {
            if let Err(e) = self.store.save(&ctx.user_id, state).await {
                state.mark_dirty();
                return Err(e);
            }
        }
        TraceEvent::StatePersisted {
            user_id: ctx.user_id.clone(),
            skipped: self.skip_persist,
        }
        .emit();
        Ok(())
    }

    fn reusable_lookup(
        &self,
        state: &CachedState,
        identity: &DeviceIdentity,
        now: DateTime<Utc>,
    ) -> Option<PostcodeLookup> {
        if self.policy.should_refresh_postcode(state, &identity.location, now) {
            None
        } else {
            state.postcode_cache.clone()
        }
    }

    fn progress_target(&self, ctx: &TurnContext) -> ProgressTarget {
        ProgressTarget {
            device: self.devices.clone(),
            device_id: ctx.device_id.clone(),
        }
    }
}
