//! REST implementation of [`ScheduleProvider`].
//!
//! `RestCouncilClient` wraps a `reqwest::Client` and translates every trait
//! method into the corresponding GET against the council API.  Each call
//! is bounded by the configured timeout and attempted exactly once: the
//! turn deadline leaves no room for back-off.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bc_domain::config::UpstreamConfig;
use bc_domain::error::{Error, Result};
use bc_domain::trace::TraceEvent;
use bc_domain::CollectionEvent;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::provider::ScheduleProvider;
use crate::types::{CollectionSearchResponse, LocationDto};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for the council waste-calendar API.
///
/// Created once and reused for the lifetime of the process.
/// The underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestCouncilClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RestCouncilClient {
    /// The configured per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a new client from the shared `UpstreamConfig`.
    pub fn new(cfg: &UpstreamConfig) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bincollections/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let base_url = cfg.base_url.trim_end_matches('/').to_owned();

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("Accept", "application/json")
            .header("X-Request-Id", Uuid::new_v4().to_string())
    }

    /// Build the full URL for a path like `/address/search/`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send once, trace the outcome, and reject non-2xx responses.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = self.decorate(rb).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                let status = resp.status();
                TraceEvent::UpstreamCall {
                    endpoint: endpoint.to_owned(),
                    status: status.as_u16(),
                    duration_ms,
                }
                .emit();

                if !status.is_success() {
                    return Err(Error::Http(format!(
                        "{endpoint} returned {}",
                        status.as_u16()
                    )));
                }
                Ok(resp)
            }
            Err(e) => {
                TraceEvent::UpstreamCall {
                    endpoint: endpoint.to_owned(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                Err(from_reqwest(e))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        rb: RequestBuilder,
    ) -> Result<T> {
        let resp = self.execute(endpoint, rb).await?;
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Http(format!("{endpoint}: malformed response: {e}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl ScheduleProvider for RestCouncilClient {
    async fn search_locations(&self, postcode: &str) -> Result<Vec<LocationDto>> {
        let url = self.url("/address/search/");
        let rb = self.http.get(&url).query(&[("postCode", postcode)]);
        self.get_json("GET /address/search/", rb).await
    }

    async fn collections_for(&self, location_id: &str, count: u32) -> Result<Vec<CollectionEvent>> {
        let url = self.url(&format!("/collection/search/{location_id}/"));
        let rb = self
            .http
            .get(&url)
            .query(&[("numberOfCollections", count)]);
        let resp: CollectionSearchResponse =
            self.get_json("GET /collection/search/", rb).await?;
        resp.into_events()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
