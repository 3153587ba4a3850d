//! Campaign timing policy.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{Mode, PerMode};

/// Time windows that decide when a campaign is due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum hours between two attempts, per mode.
    /// Unset entries default to 4 (once, incremental) and 6 (continuous).
    #[serde(default)]
    pub min_interval_hours: PerMode<Option<u64>>,

    /// Days without an accepted result after which a campaign counts as idle.
    #[serde(default = "default_idle_days")]
    pub idle_days: u64,

    /// Minimum days between attempts of an idle campaign.
    #[serde(default = "default_idle_retry_days")]
    pub idle_retry_days: u64,

    /// Days after which a once campaign with nothing accepted is dropped.
    #[serde(default = "default_obsolete_days")]
    pub obsolete_days: u64,

    /// Minimum hours between two local inventory checks of a campaign.
    #[serde(default = "default_local_check_interval_hours")]
    pub local_check_interval_hours: u64,
}

fn default_idle_days() -> u64 {
    10
}

fn default_idle_retry_days() -> u64 {
    2
}

fn default_obsolete_days() -> u64 {
    90
}

fn default_local_check_interval_hours() -> u64 {
    1
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_interval_hours: PerMode::default(),
            idle_days: default_idle_days(),
            idle_retry_days: default_idle_retry_days(),
            obsolete_days: default_obsolete_days(),
            local_check_interval_hours: default_local_check_interval_hours(),
        }
    }
}

impl PolicyConfig {
    pub fn min_interval(&self, mode: Mode) -> Duration {
        let hours = self.min_interval_hours.get(mode).unwrap_or(match mode {
            Mode::Once | Mode::Incremental => 4,
            Mode::Continuous => 6,
        });
        Duration::hours(hours as i64)
    }

    pub fn idle_window(&self) -> Duration {
        Duration::days(self.idle_days as i64)
    }

    pub fn idle_retry(&self) -> Duration {
        Duration::days(self.idle_retry_days as i64)
    }

    pub fn obsolete_after(&self) -> Duration {
        Duration::days(self.obsolete_days as i64)
    }

    pub fn local_check_interval(&self) -> Duration {
        Duration::hours(self.local_check_interval_hours as i64)
    }
}
