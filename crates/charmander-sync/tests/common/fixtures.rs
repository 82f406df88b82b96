//! Test fixtures for sync integration tests.

use charmander_manager::{Node, Task};

/// Builder for test tasks.
pub struct TaskBuilder {
    id: String,
    internal_id: String,
    not_metered: bool,
    running: bool,
}

impl TaskBuilder {
    /// Creates a builder for an instance with the given internal ID.
    pub fn new(internal_id: &str) -> Self {
        Self {
            id: "task".to_owned(),
            internal_id: internal_id.to_owned(),
            not_metered: false,
            running: false,
        }
    }

    /// Sets the user-facing task ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_owned();
        self
    }

    /// Excludes the task from the metered namespace.
    pub fn not_metered(mut self) -> Self {
        self.not_metered = true;
        self
    }

    /// Marks the instance as running.
    pub fn running(mut self) -> Self {
        self.running = true;
        self
    }

    pub fn build(self) -> Task {
        Task {
            id: self.id,
            docker_image: "busybox:latest".to_owned(),
            mem: 64 * 1024 * 1024,
            cpus: 0.25,
            internal_id: self.internal_id,
            not_metered: self.not_metered,
            running: self.running,
            ..Task::default()
        }
    }
}

pub fn make_node(hostname: &str) -> Node {
    Node::new(hostname)
}
