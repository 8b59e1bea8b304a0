//! `bc-domain`: shared types for the bin-collections service.
//!
//! Holds the error taxonomy, configuration, structured trace events and
//! the schedule data model (categories, events, device identity, the
//! cached per-user state object).

pub mod category;
pub mod config;
pub mod day;
pub mod error;
pub mod event;
pub mod identity;
pub mod state;
pub mod trace;

pub use category::Category;
pub use day::{CollectionDate, RelativeDay};
pub use error::{Error, ErrorKind, Result};
pub use event::CollectionEvent;
pub use identity::{DeviceAddress, DeviceIdentity, DeviceLocation, LocationKey};
pub use state::{CachedState, PostcodeLookup};
