//! Periodic publication of cluster state to the key-value store.
//!
//! Every tick, the [`StateReporter`] snapshots nodes and tasks from the
//! [`Manager`](charmander_manager::Manager), pushes them into the
//! external store under TTL-stamped keys, and pulls externally computed
//! task intelligence back in. The store being unreachable is never an
//! error: the cycle is skipped and retried on the next tick.
//!
//! # Key namespaces
//!
//! | Key pattern | TTL | Purpose |
//! |---|---|---|
//! | `charmander:nodes:<hostname>` | 30s | cluster topology |
//! | `charmander:tasks-metered:<internal id>` | 30s | metering feed |
//! | `charmander:tasks:<internal id>` | 30s | full task-state feed |
//! | `charmander:task-intelligence:<task id>:<attribute>` | collector-defined | feedback into the manager |

pub mod config;
pub mod connector;
pub mod error;
pub mod reporter;

pub use config::SyncConfig;
pub use connector::StoreConnection;
pub use error::{Result, SyncError};
pub use reporter::{
    MetricsSnapshot, StateReporter, INTELLIGENCE_KEY_PREFIX, METERED_TASK_KEY_PREFIX,
    NODE_KEY_PREFIX, TASK_KEY_PREFIX,
};
