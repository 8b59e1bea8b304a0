use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Council waste-calendar API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Per-call timeout.  The voice platform gives the whole turn only a
    /// few seconds, so this stays well under that.
    #[serde(default = "d_5000")]
    pub timeout_ms: u64,
    /// How many upcoming collections to request per location.
    #[serde(default = "d_12")]
    pub number_of_collections: u32,
    /// Upper bound on location candidates probed per refresh.
    #[serde(default = "d_3")]
    pub max_probes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            timeout_ms: 5000,
            number_of_collections: 12,
            max_probes: 3,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "https://servicelayer3c.azure-api.net/wastecalendar".into()
}
fn d_5000() -> u64 {
    5000
}
fn d_12() -> u32 {
    12
}
fn d_3() -> usize {
    3
}
