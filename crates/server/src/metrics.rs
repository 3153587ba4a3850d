//! Prometheus metrics for observability.
//!
//! The registry holds every core metric plus a few gauges sampled from the
//! running components each time `/metrics` is scraped.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Sampled gauges
// =============================================================================

/// Campaigns currently stored.
pub static CAMPAIGNS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quarry_campaigns", "Number of stored campaigns").unwrap()
});

/// Connectivity as last probed (1 = online, 0 = offline).
pub static GATE_ONLINE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quarry_gate_online", "Whether sources are reachable").unwrap()
});

/// Sources currently cooling down after a quota hit.
pub static SOURCES_COOLING_DOWN: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quarry_sources_cooling_down",
        "Number of sources paused after a quota hit",
    )
    .unwrap()
});

/// Scheduler running state (1 = running, 0 = stopped or absent).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quarry_scheduler_running",
        "Whether the scheduler loop is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Jobs waiting for a worker slot.
pub static JOBS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quarry_jobs_queued", "Campaign jobs waiting for a worker").unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(CAMPAIGNS.clone())).unwrap();
    registry.register(Box::new(GATE_ONLINE.clone())).unwrap();
    registry
        .register(Box::new(SOURCES_COOLING_DOWN.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(JOBS_QUEUED.clone())).unwrap();

    // Core metrics (scheduler, rounds, gate)
    for metric in quarry_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Sample gauges from the current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(count) = state.campaigns().count() {
        CAMPAIGNS.set(count);
    }

    let gate = state.gate().status().await;
    GATE_ONLINE.set(i64::from(gate.online));
    SOURCES_COOLING_DOWN.set(gate.cooldowns.len() as i64);

    let running = match state.scheduler() {
        Some(scheduler) => scheduler.status().await.running,
        None => false,
    };
    SCHEDULER_RUNNING.set(i64::from(running));

    JOBS_QUEUED.set(state.pool().status().queued_jobs as i64);
}
