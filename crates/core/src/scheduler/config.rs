//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the campaign scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Enable/disable the scheduler loop.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between two ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Maximum campaigns running at once.
    #[serde(default = "default_workers_limit")]
    pub workers_limit: usize,

    /// A campaign round still running after this many seconds is abandoned.
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Pages requested once a campaign has widened its search.
    #[serde(default = "default_page_budget_max")]
    pub page_budget_max: u32,

    /// Candidate records older than this are purged.
    #[serde(default = "default_result_retention_days")]
    pub result_retention_days: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    60
}

fn default_workers_limit() -> usize {
    5
}

fn default_job_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_page_budget_max() -> u32 {
    20
}

fn default_result_retention_days() -> u64 {
    120
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tick_interval_secs: default_tick_interval(),
            workers_limit: default_workers_limit(),
            job_timeout_secs: default_job_timeout(),
            page_budget_max: default_page_budget_max(),
            result_retention_days: default_result_retention_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.tick_interval_secs, 60);
        assert_eq!(config.workers_limit, 5);
        assert_eq!(config.job_timeout_secs, 1800);
        assert_eq!(config.page_budget_max, 20);
        assert_eq!(config.result_retention_days, 120);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: SchedulerConfig = toml::from_str("workers_limit = 2").unwrap();
        assert_eq!(config.workers_limit, 2);
        assert_eq!(config.tick_interval_secs, 60);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            enabled = false
            tick_interval_secs = 30
            workers_limit = 8
            job_timeout_secs = 600
            page_budget_max = 5
            result_retention_days = 30
        "#;
        let config: SchedulerConfig = toml::from_str(toml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.tick_interval_secs, 30);
        assert_eq!(config.workers_limit, 8);
        assert_eq!(config.job_timeout_secs, 600);
        assert_eq!(config.page_budget_max, 5);
        assert_eq!(config.result_retention_days, 30);
    }
}
