//! Schedule refresh: device location → candidate locations → events.
//!
//! A postcode usually maps to many registered addresses.  The house whose
//! number matches the device goes first; after that only a few evenly
//! spaced candidates are probed, concurrently, because probing every one
//! in series would blow the turn deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use bc_council::{LocationDto, ScheduleProvider};
use bc_domain::config::Config;
use bc_domain::error::{Error, Result};
use bc_domain::trace::TraceEvent;
use bc_domain::{CachedState, CollectionEvent, DeviceIdentity, PostcodeLookup};

use crate::device::{DeviceGateway, PLEASE_WAIT};

/// Whether upstream answers may come from the provider's process-local
/// memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Cached,
    /// The user asked for fresh data.
    Fresh,
}

/// Where to send the best-effort "please wait" notice.
#[derive(Clone)]
pub struct ProgressTarget {
    pub device: Arc<dyn DeviceGateway>,
    pub device_id: String,
}

/// Orchestrates one schedule refresh against the upstream provider.
#[derive(Clone)]
pub struct RefreshPipeline {
    provider: Arc<dyn ScheduleProvider>,
    number_of_collections: u32,
    max_probes: usize,
    probe_timeout: Duration,
}

impl RefreshPipeline {
    pub fn new(
        provider: Arc<dyn ScheduleProvider>,
        number_of_collections: u32,
        max_probes: usize,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            number_of_collections,
            max_probes: max_probes.max(1),
            probe_timeout,
        }
    }

    pub fn from_config(provider: Arc<dyn ScheduleProvider>, cfg: &Config) -> Self {
        Self::new(
            provider,
            cfg.upstream.number_of_collections,
            cfg.upstream.max_probes,
            Duration::from_millis(cfg.upstream.timeout_ms),
        )
    }

    /// Fetch a fresh schedule for `identity`.
    ///
    /// `lookup` is a still-valid postcode lookup for the same place; when
    /// present the postcode search is skipped, unless none of its
    /// candidates has any events.  The returned state has its watermark at
    /// the epoch and is marked dirty.
    pub async fn refresh(
        &self,
        identity: &DeviceIdentity,
        lookup: Option<PostcodeLookup>,
        progress: Option<ProgressTarget>,
        now: DateTime<Utc>,
    ) -> Result<CachedState> {
        self.refresh_with(identity, lookup, progress, now, Fetch::Cached)
            .await
    }

    /// [`refresh`](Self::refresh) with control over the provider memo.
    pub async fn refresh_with(
        &self,
        identity: &DeviceIdentity,
        lookup: Option<PostcodeLookup>,
        progress: Option<ProgressTarget>,
        now: DateTime<Utc>,
        fetch: Fetch,
    ) -> Result<CachedState> {
        let start = Instant::now();

        if let Some(target) = progress {
            send_progress_notice(target);
        }

        let (lookup, reused) = match lookup.filter(|l| l.location == identity.location) {
            Some(cached) => {
                tracing::debug!(candidates = cached.location_ids.len(), "reusing postcode lookup");
                (cached, true)
            }
            None => (self.lookup_postcode(identity, now, fetch).await?, false),
        };

        let probed = self.probe_candidates(&lookup.location_ids, fetch).await;
        let (lookup, (location_id, events)) = match probed {
            Ok(found) => (lookup, found),
            // The council may have renumbered the postcode's locations.
            Err(Error::UpstreamUnavailable(reason)) if reused => {
                tracing::info!(%reason, "cached postcode lookup found nothing, searching again");
                let fresh = self.lookup_postcode(identity, now, Fetch::Fresh).await?;
                let found = self.probe_candidates(&fresh.location_ids, fetch).await?;
                (fresh, found)
            }
            Err(e) => return Err(e),
        };

        TraceEvent::ScheduleRefreshed {
            postcode_outward: identity.location.outward().to_owned(),
            location_id,
            candidates: lookup.location_ids.len(),
            events: events.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(CachedState::fetched(
            events,
            identity.clone(),
            Some(lookup),
            now,
        ))
    }

    async fn lookup_postcode(
        &self,
        identity: &DeviceIdentity,
        now: DateTime<Utc>,
        fetch: Fetch,
    ) -> Result<PostcodeLookup> {
        let location = &identity.location;
        let results = match fetch {
            Fetch::Cached => self.provider.search_locations(&location.postcode).await?,
            Fetch::Fresh => {
                self.provider
                    .search_locations_uncached(&location.postcode)
                    .await?
            }
        };
        if results.is_empty() {
            return Err(Error::LocationNotFound(location.outward().to_owned()));
        }
        Ok(PostcodeLookup {
            location: location.clone(),
            location_ids: order_candidates(&results, location.building.as_deref()),
            fetched_at: now,
        })
    }

    /// Probe a sample of candidates concurrently and pick the first, by
    /// candidate order, that has any events.
    async fn probe_candidates(
        &self,
        candidates: &[String],
        fetch: Fetch,
    ) -> Result<(String, Vec<CollectionEvent>)> {
        let picks = probe_indices(candidates.len(), self.max_probes);
        let count = self.number_of_collections;
        let probes = picks.iter().map(|&i| {
            let id = candidates[i].as_str();
            async move {
                let call = async {
                    match fetch {
                        Fetch::Cached => self.provider.collections_for(id, count).await,
                        Fetch::Fresh => self.provider.collections_for_uncached(id, count).await,
                    }
                };
                let outcome = tokio::time::timeout(self.probe_timeout, call)
                    .await
                    .unwrap_or_else(|_| Err(Error::Timeout(format!("probing location {id}"))));
                (id, outcome)
            }
        });
        let outcomes = join_all(probes).await;

        let mut failures = 0usize;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(events) => {
                    TraceEvent::LocationProbed {
                        location_id: id.to_owned(),
                        events: events.len(),
                        error: None,
                    }
                    .emit();
                    if !events.is_empty() {
                        return Ok((id.to_owned(), events));
                    }
                }
                // Bad data must not be mistaken for "no data here".
                Err(e @ (Error::UnknownCategory(_) | Error::InvalidEvent(_))) => return Err(e),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(location_id = id, error = %e, "location probe failed");
                    TraceEvent::LocationProbed {
                        location_id: id.to_owned(),
                        events: 0,
                        error: Some(e.to_string()),
                    }
                    .emit();
                }
            }
        }

        Err(Error::UpstreamUnavailable(format!(
            "no events from {} probed of {} candidate locations ({failures} failed)",
            picks.len(),
            candidates.len()
        )))
    }
}

/// Fire-and-forget: the notice only masks latency, so its outcome never
/// reaches the caller.
fn send_progress_notice(target: ProgressTarget) {
    tokio::spawn(async move {
        if let Err(e) = target
            .device
            .notify_progress(&target.device_id, PLEASE_WAIT)
            .await
        {
            tracing::debug!(error = %e, "progress notice failed");
        }
    });
}

/// Candidate location IDs with the building match first, remaining
/// candidates in upstream order.
pub fn order_candidates(results: &[LocationDto], building: Option<&str>) -> Vec<String> {
    let matched = building.and_then(|b| results.iter().position(|r| r.matches_building(b)));
    let mut ids = Vec::with_capacity(results.len());
    if let Some(i) = matched {
        ids.push(results[i].id.clone());
    }
    ids.extend(
        results
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != matched)
            .map(|(_, r)| r.id.clone()),
    );
    ids
}

/// Indices of up to `max_probes` candidates spread evenly over
/// `0..candidates`, always starting at 0.
pub fn probe_indices(candidates: usize, max_probes: usize) -> Vec<usize> {
    let probes = candidates.min(max_probes.max(1));
    (0..probes).map(|i| i * candidates / probes).collect()
}
