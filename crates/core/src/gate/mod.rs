//! Quota and availability gate.
//!
//! A source is usable when the shared network path is up (checked once per
//! tick through a [`ConnectivityProbe`]) and it is not cooling down after a
//! quota or rate-limit signal.

mod config;
mod probe;

pub use config::GateConfig;
pub use probe::{AlwaysOnline, ConnectivityProbe, HttpProbe};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::metrics;

/// An active cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cooldown {
    pub source: String,
    pub until: DateTime<Utc>,
}

/// Snapshot of the gate for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct GateStatus {
    pub online: bool,
    pub cooldowns: Vec<Cooldown>,
}

/// Tracks whether sources may be queried.
pub struct AvailabilityGate {
    probe: Arc<dyn ConnectivityProbe>,
    cooldown: Duration,
    online: AtomicBool,
    cooldowns: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl AvailabilityGate {
    /// Create a gate. It reports online until the first [`refresh`](Self::refresh).
    pub fn new(probe: Arc<dyn ConnectivityProbe>, cooldown: Duration) -> Self {
        Self {
            probe,
            cooldown,
            online: AtomicBool::new(true),
            cooldowns: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(probe: Arc<dyn ConnectivityProbe>, config: &GateConfig) -> Self {
        Self::new(probe, Duration::seconds(config.quota_cooldown_secs as i64))
    }

    /// Probe connectivity and remember the result. Returns the new online flag.
    pub async fn refresh(&self) -> bool {
        let reachable = self.probe.is_reachable().await;
        let was_online = self.online.swap(reachable, Ordering::SeqCst);

        metrics::PROBE_RESULTS
            .with_label_values(&[if reachable { "online" } else { "offline" }])
            .inc();

        match (was_online, reachable) {
            (true, false) => warn!("Connectivity lost, sources unavailable"),
            (false, true) => info!("Connectivity restored"),
            _ => {}
        }

        reachable
    }

    /// Last probed connectivity.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub async fn is_source_available(&self, source: &str) -> bool {
        self.is_source_available_at(source, Utc::now()).await
    }

    /// Availability of `source` at `now`. Expired cooldowns are cleared.
    pub async fn is_source_available_at(&self, source: &str, now: DateTime<Utc>) -> bool {
        if !self.is_online() {
            return false;
        }

        {
            let cooldowns = self.cooldowns.read().await;
            match cooldowns.get(source) {
                None => return true,
                Some(until) if now < *until => return false,
                Some(_) => {}
            }
        }

        let mut cooldowns = self.cooldowns.write().await;
        if cooldowns.get(source).is_some_and(|until| now >= *until) {
            cooldowns.remove(source);
            info!(source = source, "Quota cooldown expired");
        }
        true
    }

    pub async fn report_quota_hit(&self, source: &str) {
        self.report_quota_hit_at(source, Utc::now()).await
    }

    /// Start a cooldown for `source`. A hit during an active cooldown leaves
    /// its expiry unchanged.
    pub async fn report_quota_hit_at(&self, source: &str, now: DateTime<Utc>) {
        metrics::QUOTA_HITS.with_label_values(&[source]).inc();

        let mut cooldowns = self.cooldowns.write().await;
        if let Some(until) = cooldowns.get(source) {
            if now < *until {
                return;
            }
        }

        let until = now + self.cooldown;
        cooldowns.insert(source.to_string(), until);
        warn!(source = source, until = %until, "Source hit its quota, cooling down");
    }

    pub async fn status(&self) -> GateStatus {
        self.status_at(Utc::now()).await
    }

    /// Snapshot at `now`. Cooldowns that have run out are left out even if
    /// they have not been pruned yet.
    pub async fn status_at(&self, now: DateTime<Utc>) -> GateStatus {
        let cooldowns = self.cooldowns.read().await;
        let mut active: Vec<Cooldown> = cooldowns
            .iter()
            .filter(|(_, until)| **until > now)
            .map(|(source, until)| Cooldown {
                source: source.clone(),
                until: *until,
            })
            .collect();
        active.sort_by(|a, b| a.source.cmp(&b.source));

        GateStatus {
            online: self.is_online(),
            cooldowns: active,
        }
    }
}
