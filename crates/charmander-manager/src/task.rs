//! The task entity.

use serde::{Deserialize, Serialize};

/// SLA constraint: at most one running instance of a task ID per node.
pub const SLA_ONE_PER_NODE: &str = "one-per-node";

/// SLA constraint: at most one running instance of a task ID cluster-wide.
pub const SLA_SINGLETON: &str = "singleton";

/// One unit of deployable work.
///
/// The lowercase-named fields are the task's public definition and are
/// what external consumers of the state feed see. The PascalCase-named
/// fields are runtime identity assigned while an instance is scheduled;
/// they serialize alongside the definition but are cleared by
/// [`reset`](Self::reset) when the instance returns to the unscheduled
/// state.
///
/// `id` names the task definition and may have many running instances
/// (unless constrained by `sla`); `internal_id` names exactly one
/// scheduled instance at a point in time and keys the per-instance store
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// User-facing task identifier.
    pub id: String,
    /// Container image reference.
    #[serde(rename = "dockerimage")]
    pub docker_image: String,
    /// Memory request in bytes.
    #[serde(with = "serde_u64_string")]
    pub mem: u64,
    /// CPU share request.
    #[serde(with = "serde_f64_string")]
    pub cpus: f64,
    /// SLA placement constraint; stored and round-tripped, never
    /// validated here. Empty means unconstrained.
    pub sla: String,
    /// Node-type placement hint.
    #[serde(rename = "nodetype")]
    pub node_type: String,
    /// Node-name placement hint.
    #[serde(rename = "nodename")]
    pub node_name: String,
    /// Excludes the task from the metered key namespace.
    #[serde(rename = "notmetered")]
    pub not_metered: bool,
    /// Whether the task may be moved during a reshuffle.
    pub reshuffleable: bool,
    /// Launch arguments, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    /// Volume mounts, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// Port mappings, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,

    /// Process-internal identifier of this scheduled instance.
    #[serde(rename = "InternalID")]
    pub internal_id: String,
    /// Identifier of the agent executing the instance.
    #[serde(rename = "SlaveID")]
    pub slave_id: String,
    /// Identifier of the running container.
    #[serde(rename = "ContainerID")]
    pub container_id: String,
    /// Creation timestamp, seconds since the epoch.
    #[serde(rename = "CreatedAt")]
    pub created_at: i64,
    /// Opaque launch descriptor produced by the resource-manager protocol
    /// binding. Carried untouched.
    #[serde(rename = "TaskInfo")]
    pub task_info: Option<serde_json::Value>,
    /// Whether a launch request has been sent for this instance.
    #[serde(rename = "RequestSent")]
    pub request_sent: bool,
    /// Whether the instance is running.
    #[serde(rename = "Running")]
    pub running: bool,
}

impl Task {
    /// Returns the task to an unscheduled state for re-placement.
    ///
    /// Clears the runtime identity fields only; the public definition is
    /// untouched.
    pub fn reset(&mut self) {
        self.internal_id.clear();
        self.slave_id.clear();
        self.container_id.clear();
        self.created_at = 0;
        self.task_info = None;
        self.request_sent = false;
        self.running = false;
    }
}

/// A volume mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    /// Path on the host.
    #[serde(rename = "hostpath")]
    pub host_path: String,
    /// Path inside the container.
    #[serde(rename = "containerpath")]
    pub container_path: String,
}

/// A port mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    /// Port on the host.
    #[serde(rename = "hostport")]
    pub host_port: u32,
    /// Port inside the container.
    #[serde(rename = "containerport")]
    pub container_port: u32,
}

/// Serde helper for u64 encoded as a JSON string.
mod serde_u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde helper for f64 encoded as a JSON string.
mod serde_f64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
