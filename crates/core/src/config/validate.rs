use super::{types::Config, ConfigError};
use crate::filter::ResultFilter;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scheduler has workers, a tick interval, a job timeout and a page budget
/// - Every category and mode has filter thresholds
/// - The source, when configured, has a name and a URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let scheduler = &config.scheduler;
    for (name, value) in [
        ("scheduler.workers_limit", scheduler.workers_limit as u64),
        ("scheduler.tick_interval_secs", scheduler.tick_interval_secs),
        ("scheduler.job_timeout_secs", scheduler.job_timeout_secs),
        ("scheduler.page_budget_max", scheduler.page_budget_max as u64),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    ResultFilter::from_config(&config.filters)?;

    if let Some(source) = &config.source {
        if source.name.trim().is_empty() || source.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source.name and source.url are required".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::source::SourceConfig;
    use crate::testing::fixtures;
    use std::net::IpAddr;

    fn valid_config() -> Config {
        Config {
            filters: fixtures::filter_config(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..valid_config()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = valid_config();
        config.scheduler.workers_limit = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scheduler.workers_limit"));
    }

    #[test]
    fn test_validate_missing_filters_fails() {
        let err = validate_config(&Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("filters.categories.movie"));
    }

    #[test]
    fn test_validate_source_without_url_fails() {
        let config = Config {
            source: Some(SourceConfig {
                name: "idx".to_string(),
                url: " ".to_string(),
                api_key: None,
                timeout_secs: 30,
            }),
            ..valid_config()
        };
        assert!(validate_config(&config).is_err());
    }
}
