//! The reconciliation loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use charmander_manager::Manager;

use crate::config::SyncConfig;
use crate::connector::StoreConnection;

/// Key prefix for node snapshots.
pub const NODE_KEY_PREFIX: &str = "charmander:nodes:";

/// Key prefix for the metered task subset.
pub const METERED_TASK_KEY_PREFIX: &str = "charmander:tasks-metered:";

/// Key prefix for the full task set.
pub const TASK_KEY_PREFIX: &str = "charmander:tasks:";

/// Key prefix under which external collectors publish task intelligence.
pub const INTELLIGENCE_KEY_PREFIX: &str = "charmander:task-intelligence:";

/// Publishes cluster state to the store and pulls task intelligence back.
///
/// One cycle pushes nodes, then the metered task subset, then the full
/// task set, each key stamped with an expiry, over one short-lived
/// connection; a second connection pulls intelligence keys back into the
/// manager. An unreachable store skips the whole cycle.
pub struct StateReporter {
    manager: Arc<dyn Manager>,
    config: SyncConfig,
    metrics: SyncMetrics,
}

impl StateReporter {
    /// Creates a reporter over the given manager.
    pub fn new(manager: Arc<dyn Manager>, config: SyncConfig) -> Self {
        Self {
            manager,
            config,
            metrics: SyncMetrics::default(),
        }
    }

    /// Runs reconciliation cycles until `cancel` fires.
    ///
    /// The first cycle starts immediately; every subsequent cycle waits
    /// out the configured interval regardless of how the previous one
    /// concluded.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                () = cancel.cancelled() => {
                    info!("state reporter stopping");
                    return;
                }
            }
        }
    }

    /// Executes one push/pull cycle.
    ///
    /// Public so tests can drive single cycles deterministically instead
    /// of waiting on the timer.
    pub async fn run_cycle(&self) {
        self.metrics.cycles.fetch_add(1, Ordering::Relaxed);

        let address = self.manager.store_address();
        let Some(mut conn) = StoreConnection::connect(&address, self.config.connect_timeout).await
        else {
            self.metrics.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            debug!(address, "store unavailable, skipping cycle");
            return;
        };

        for node in self.manager.nodes() {
            let key = format!("{NODE_KEY_PREFIX}{}", node.hostname);
            self.publish(&mut conn, &key, &node).await;
        }

        let tasks = self.manager.tasks();
        for task in tasks.iter().filter(|task| !task.not_metered) {
            let key = format!("{METERED_TASK_KEY_PREFIX}{}", task.internal_id);
            self.publish(&mut conn, &key, task).await;
        }
        for task in &tasks {
            let key = format!("{TASK_KEY_PREFIX}{}", task.internal_id);
            self.publish(&mut conn, &key, task).await;
        }
        conn.shutdown().await;

        self.pull_intelligence(&address).await;
    }

    /// Serialises one entity and writes its `SET` + `EXPIRE` pair.
    ///
    /// A serialisation failure skips that entity and leaves the rest of
    /// the batch alone.
    async fn publish<T: Serialize>(&self, conn: &mut StoreConnection, key: &str, entity: &T) {
        let json = match serde_json::to_string(entity) {
            Ok(json) => json,
            Err(error) => {
                self.metrics
                    .serialisation_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!(key, %error, "entity serialisation failed, skipping");
                return;
            }
        };
        let ttl = self.config.entry_ttl_secs.to_string();
        conn.send(&["SET", key, &json]).await;
        conn.send(&["EXPIRE", key, &ttl]).await;
        self.metrics.entries_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Pulls intelligence keys over their own connection and feeds them
    /// into the manager.
    async fn pull_intelligence(&self, address: &str) {
        let Some(mut conn) = StoreConnection::connect(address, self.config.connect_timeout).await
        else {
            debug!(address, "store unavailable, skipping intelligence pull");
            return;
        };

        let pattern = format!("{INTELLIGENCE_KEY_PREFIX}*");
        conn.send(&["KEYS", &pattern]).await;
        let keys = match conn.read_array().await {
            Ok(keys) => keys,
            Err(error) => {
                self.metrics.malformed_replies.fetch_add(1, Ordering::Relaxed);
                warn!(%error, "intelligence key listing failed");
                conn.shutdown().await;
                return;
            }
        };

        for key in keys {
            conn.send(&["GET", &key]).await;
            let value = match conn.read_bulk().await {
                Ok(Some(value)) => value,
                // key expired between KEYS and GET
                Ok(None) => continue,
                Err(error) => {
                    self.metrics.malformed_replies.fetch_add(1, Ordering::Relaxed);
                    // framing is unreliable past a malformed reply
                    warn!(key, %error, "intelligence value read failed, abandoning pull");
                    break;
                }
            };
            self.apply_intelligence(&key, &value);
        }
        conn.shutdown().await;
    }

    /// Splits an intelligence key into task ID and attribute and records
    /// the value in the manager. Keys that do not split into exactly two
    /// parts after the namespace prefix are skipped and counted.
    fn apply_intelligence(&self, key: &str, value: &str) {
        let Some(rest) = key.strip_prefix(INTELLIGENCE_KEY_PREFIX) else {
            self.metrics.malformed_keys.fetch_add(1, Ordering::Relaxed);
            warn!(key, "intelligence key outside expected namespace, skipping");
            return;
        };
        let parts: Vec<&str> = rest.split(':').collect();
        match parts.as_slice() {
            [task_id, attribute] => {
                self.manager.set_task_intelligence(task_id, attribute, value);
            }
            _ => {
                self.metrics.malformed_keys.fetch_add(1, Ordering::Relaxed);
                warn!(key, "malformed intelligence key, skipping");
            }
        }
    }

    /// Snapshot of the cycle counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.metrics.cycles.load(Ordering::Relaxed),
            cycles_skipped: self.metrics.cycles_skipped.load(Ordering::Relaxed),
            entries_published: self.metrics.entries_published.load(Ordering::Relaxed),
            malformed_replies: self.metrics.malformed_replies.load(Ordering::Relaxed),
            malformed_keys: self.metrics.malformed_keys.load(Ordering::Relaxed),
            serialisation_failures: self.metrics.serialisation_failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for StateReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateReporter")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Cycle counters.
#[derive(Debug, Default)]
struct SyncMetrics {
    cycles: AtomicU64,
    cycles_skipped: AtomicU64,
    entries_published: AtomicU64,
    malformed_replies: AtomicU64,
    malformed_keys: AtomicU64,
    serialisation_failures: AtomicU64,
}

/// Point-in-time view of the reporter's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles skipped because the store was unreachable.
    pub cycles_skipped: u64,
    /// SET/EXPIRE pairs written.
    pub entries_published: u64,
    /// Replies that failed to decode.
    pub malformed_replies: u64,
    /// Intelligence keys that did not parse.
    pub malformed_keys: u64,
    /// Entities dropped from a batch because they would not serialise.
    pub serialisation_failures: u64,
}
