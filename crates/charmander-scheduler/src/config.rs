//! Configuration types for the scheduler process.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use charmander_sync::SyncConfig;

/// Scheduler configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Admin HTTP API configuration.
    pub api: ApiConfig,
    /// Key-value store configuration.
    pub store: StoreConfig,
    /// State sync configuration.
    pub sync: SyncConfig,
}

/// Admin HTTP API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8888),
        }
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `host:port` of the store.
    pub address: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_owned(),
        }
    }
}
