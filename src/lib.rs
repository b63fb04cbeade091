// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod broadcast;
pub mod config;
pub mod dedup;
pub mod incident;
pub mod metrics;
pub mod model;
pub mod sources;
pub mod state;
pub mod stats;
pub mod store;
pub mod window;
pub mod worker;

// ---- Re-exports for stable public API ----
// Convenient router access: `pulse_aggregator::api::create_router` or `pulse_aggregator::create_router`
pub use crate::api::create_router;
pub use crate::state::AppState;
