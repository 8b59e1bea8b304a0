use serde::Serialize;

/// Structured trace events emitted across all bin-collection crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CacheDecision {
        user_id: String,
        stale: bool,
        reason: String,
    },
    UpstreamCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    LocationProbed {
        location_id: String,
        events: usize,
        error: Option<String>,
    },
    ScheduleRefreshed {
        postcode_outward: String,
        location_id: String,
        candidates: usize,
        events: usize,
        duration_ms: u64,
    },
    StatePersisted {
        user_id: String,
        skipped: bool,
    },
    CollectionReported {
        category: String,
        date: String,
        follow_up: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "bc_event");
    }
}
