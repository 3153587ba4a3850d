//! Availability gate configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the availability gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// URL probed once per tick to decide whether sources are reachable at all.
    /// When unset the gate assumes connectivity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    /// Probe request timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// How long a source stays unavailable after a quota signal.
    #[serde(default = "default_quota_cooldown")]
    pub quota_cooldown_secs: u64,
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_quota_cooldown() -> u64 {
    43_200 // 12 hours
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_timeout_secs: default_probe_timeout(),
            quota_cooldown_secs: default_quota_cooldown(),
        }
    }
}
