//! The bin-collection session core.
//!
//! Decides when a user's cached schedule can be trusted
//! ([`FreshnessPolicy`]), rebuilds it from the council API when it cannot
//! ([`RefreshPipeline`]), answers "what's next" questions against it
//! ([`next_event`], [`Dialogue`]), and wires those into the per-turn
//! load/refresh/persist lifecycle ([`SessionOrchestrator`]).

pub mod device;
pub mod dialogue;
pub mod freshness;
pub mod orchestrator;
pub mod refresh;
pub mod selector;
pub mod store;

pub use device::{DeviceGateway, StaticDevice};
pub use dialogue::{Answer, Dialogue, Report};
pub use freshness::{FreshnessPolicy, StaleReason};
pub use orchestrator::{PreparedTurn, SessionOrchestrator, TurnContext};
pub use refresh::{Fetch, ProgressTarget, RefreshPipeline};
pub use selector::{next_event, next_event_at};
pub use store::{JsonFileStore, MemoryStore, PersistenceStore};
