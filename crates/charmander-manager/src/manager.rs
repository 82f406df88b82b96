//! The manager collaborator interface and its in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use dashmap::DashMap;

use crate::node::Node;
use crate::task::Task;

/// The scheduler's view of cluster state, as consumed by the state
/// publisher.
///
/// Implementations must hand out point-in-time snapshots that are safe to
/// read while the scheduler mutates its own state, and
/// [`set_task_intelligence`](Self::set_task_intelligence) must be safe to
/// call concurrently with those readers.
pub trait Manager: Send + Sync {
    /// Snapshot of all known nodes.
    fn nodes(&self) -> Vec<Node>;

    /// Snapshot of all scheduled tasks.
    fn tasks(&self) -> Vec<Task>;

    /// Records one externally computed task annotation.
    fn set_task_intelligence(&self, task_id: &str, attribute: &str, value: &str);

    /// `host:port` of the external key-value store.
    fn store_address(&self) -> String;
}

/// In-memory manager.
///
/// The embedding point for the wider scheduler and the observable double
/// in tests: tasks and nodes go in through the mutators, intelligence
/// written back by the publisher can be read out again.
#[derive(Debug)]
pub struct InMemoryManager {
    nodes: DashMap<String, Node>,
    tasks: DashMap<String, Task>,
    intelligence: DashMap<String, HashMap<String, String>>,
    store_address: RwLock<String>,
}

impl InMemoryManager {
    /// Creates a manager pointed at the given store address.
    #[must_use]
    pub fn new(store_address: impl Into<String>) -> Self {
        Self {
            nodes: DashMap::new(),
            tasks: DashMap::new(),
            intelligence: DashMap::new(),
            store_address: RwLock::new(store_address.into()),
        }
    }

    /// Adds or replaces a node, keyed by hostname.
    pub fn add_node(&self, node: Node) {
        self.nodes.insert(node.hostname.clone(), node);
    }

    /// Adds or replaces a task, keyed by its internal ID.
    pub fn add_task(&self, task: Task) {
        self.tasks.insert(task.internal_id.clone(), task);
    }

    /// Removes a task by internal ID.
    pub fn remove_task(&self, internal_id: &str) -> Option<Task> {
        self.tasks.remove(internal_id).map(|(_, task)| task)
    }

    /// Repoints the manager at a different store address.
    pub fn set_store_address(&self, address: impl Into<String>) {
        if let Ok(mut current) = self.store_address.write() {
            *current = address.into();
        }
    }

    /// Intelligence recorded for a task, by attribute name.
    #[must_use]
    pub fn intelligence_for(&self, task_id: &str) -> HashMap<String, String> {
        self.intelligence
            .get(task_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

impl Manager for InMemoryManager {
    fn nodes(&self) -> Vec<Node> {
        self.nodes.iter().map(|entry| entry.value().clone()).collect()
    }

    fn tasks(&self) -> Vec<Task> {
        self.tasks.iter().map(|entry| entry.value().clone()).collect()
    }

    fn set_task_intelligence(&self, task_id: &str, attribute: &str, value: &str) {
        self.intelligence
            .entry(task_id.to_owned())
            .or_default()
            .insert(attribute.to_owned(), value.to_owned());
    }

    fn store_address(&self) -> String {
        self.store_address
            .read()
            .map(|address| address.clone())
            .unwrap_or_default()
    }
}
