use std::sync::Arc;

use quarry_core::{AvailabilityGate, CampaignStore, PoolDispatcher, Scheduler};

/// Shared application state
pub struct AppState {
    campaigns: Arc<dyn CampaignStore>,
    gate: Arc<AvailabilityGate>,
    pool: Arc<PoolDispatcher>,
    scheduler: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        gate: Arc<AvailabilityGate>,
        pool: Arc<PoolDispatcher>,
        scheduler: Option<Arc<Scheduler>>,
    ) -> Self {
        Self {
            campaigns,
            gate,
            pool,
            scheduler,
        }
    }

    pub fn campaigns(&self) -> &dyn CampaignStore {
        self.campaigns.as_ref()
    }

    pub fn gate(&self) -> &AvailabilityGate {
        &self.gate
    }

    pub fn pool(&self) -> &PoolDispatcher {
        &self.pool
    }

    /// The scheduler, when a source is configured and scheduling is enabled.
    pub fn scheduler(&self) -> Option<&Arc<Scheduler>> {
        self.scheduler.as_ref()
    }
}
