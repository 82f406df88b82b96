//! Configuration for the sync engine.

use serde::Deserialize;
use std::time::Duration;

/// Sync engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between reconciliation cycles.
    #[serde(with = "serde_duration_secs")]
    pub interval: Duration,
    /// Expiry stamped on every published key, in seconds.
    ///
    /// Kept at twice the cycle interval so one missed cycle does not let
    /// observers see keys expire.
    pub entry_ttl_secs: u64,
    /// Timeout for opening a store connection.
    #[serde(with = "serde_duration_secs")]
    pub connect_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            entry_ttl_secs: 30,
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Serde helper for Duration as seconds.
mod serde_duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.entry_ttl_secs, 30);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn ttl_covers_a_missed_cycle() {
        let config = SyncConfig::default();
        assert!(config.entry_ttl_secs >= 2 * config.interval.as_secs());
    }
}
