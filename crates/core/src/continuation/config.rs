//! Continuation configuration.

use serde::{Deserialize, Serialize};

/// When an incremental campaign rolls over to the next season instead of the
/// next episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationConfig {
    /// Episode index above which a season may be considered finished.
    #[serde(default = "default_rollover_episode")]
    pub season_rollover_episode: u32,

    /// Minimum campaign age before rolling over to the next season.
    #[serde(default = "default_rollover_days")]
    pub season_rollover_days: u32,
}

fn default_rollover_episode() -> u32 {
    2
}

fn default_rollover_days() -> u32 {
    60
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            season_rollover_episode: default_rollover_episode(),
            season_rollover_days: default_rollover_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ContinuationConfig::default();
        assert_eq!(config.season_rollover_episode, 2);
        assert_eq!(config.season_rollover_days, 60);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ContinuationConfig = toml::from_str("season_rollover_days = 30").unwrap();
        assert_eq!(config.season_rollover_episode, 2);
        assert_eq!(config.season_rollover_days, 30);
    }
}
