//! Fabric configuration.

use crate::registry::DEFAULT_REGISTRY_ID;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity prefix and long-poll session timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Prefix of every identity the registry issues.
    pub registry_id: String,
    /// Longest an attached request waits with nothing to send.
    pub max_idle_ms: u64,
    /// Delay after the first queued item before flushing, to batch bursts.
    pub coalesce_delay_ms: u64,
    /// How long a session may stay detached after a flush before eviction.
    pub abandon_timeout_ms: u64,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            registry_id: DEFAULT_REGISTRY_ID.to_string(),
            max_idle_ms: 30_000,
            coalesce_delay_ms: 250,
            abandon_timeout_ms: 30_000,
        }
    }
}

impl FabricConfig {
    #[must_use]
    pub fn max_idle(&self) -> Duration {
        Duration::from_millis(self.max_idle_ms)
    }

    #[must_use]
    pub fn coalesce_delay(&self) -> Duration {
        Duration::from_millis(self.coalesce_delay_ms)
    }

    #[must_use]
    pub fn abandon_timeout(&self) -> Duration {
        Duration::from_millis(self.abandon_timeout_ms)
    }
}
