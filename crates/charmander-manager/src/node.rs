//! The node entity, as seen by the state publisher.

use serde::{Deserialize, Serialize};

/// A cluster agent.
///
/// The publisher only derives store keys from the hostname and otherwise
/// treats nodes as opaque; the full agent schema lives with the
/// resource-manager integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Agent hostname; keys the node's store entry.
    pub hostname: String,
}

impl Node {
    /// Creates a node with the given hostname.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}
