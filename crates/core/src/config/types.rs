use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::campaign::PolicyConfig;
use crate::continuation::ContinuationConfig;
use crate::filter::FilterConfig;
use crate::gate::GateConfig;
use crate::inventory::InventoryConfig;
use crate::scheduler::SchedulerConfig;
use crate::source::SourceConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub continuation: ContinuationConfig,
    /// Result filter thresholds. Every category and mode must be present.
    #[serde(default)]
    pub filters: FilterConfig,
    /// Search source. Without one the scheduler does not run.
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("quarry.db")
}
