//! Types for the campaign scheduler.

use serde::Serialize;

use crate::gate::GateStatus;

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Connectivity at the start of the tick. Nothing else happens when false.
    pub online: bool,
    /// Campaigns validated.
    pub considered: usize,
    /// Campaigns removed during validation.
    pub retired: usize,
    /// Jobs handed to the dispatcher.
    pub dispatched: usize,
    /// Campaigns skipped because a previous job is still running.
    pub in_flight: usize,
    /// Campaigns skipped because their source is cooling down.
    pub cooling_down: usize,
    /// Candidate records purged for age.
    pub purged: usize,
}

impl TickReport {
    pub fn outcome(&self) -> &'static str {
        if !self.online {
            "offline"
        } else if self.dispatched > 0 {
            "dispatched"
        } else {
            "idle"
        }
    }
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    /// Campaign jobs dispatched and not yet finished.
    pub in_flight: usize,
    pub gate: GateStatus,
}
