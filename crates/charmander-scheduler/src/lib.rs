//! Scheduler process: state publication loop and admin HTTP surface.
//!
//! Wires the in-memory manager, the periodic
//! [`StateReporter`](charmander_sync::StateReporter), and a small
//! administrative HTTP API (liveness probe plus sync counters) into one
//! long-running process.

pub mod api;
pub mod config;

pub use config::{ApiConfig, SchedulerConfig, StoreConfig};
