// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod adapter;
pub mod api;
pub mod config;
pub mod cycle;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod source;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::adapter::{ExtractionResult, VersionAdapter};
pub use crate::api::{create_router, AppState};
pub use crate::cycle::{run_cycle, CycleReport};
pub use crate::error::{Result, WatchError};
pub use crate::registry::AdapterRegistry;
pub use crate::source::{SourceId, SourceSpec};
pub use crate::store::{VersionRecord, VersionStore};
