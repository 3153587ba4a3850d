//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scheduler (ticks, dispatched jobs, timeouts)
//! - Campaign rounds (verdicts, errors, retirements, continuations)
//! - Availability gate (probe results, quota hits)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Scheduler ticks total by outcome.
pub static SCHEDULER_TICKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_scheduler_ticks_total", "Total scheduler ticks"),
        &["outcome"], // "dispatched", "idle", "offline"
    )
    .unwrap()
});

/// Jobs handed to the dispatcher.
pub static JOBS_DISPATCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quarry_jobs_dispatched_total",
        "Total campaign jobs dispatched",
    )
    .unwrap()
});

/// Jobs abandoned because they exceeded their timeout.
pub static JOB_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quarry_job_timeouts_total",
        "Total campaign jobs abandoned after timeout",
    )
    .unwrap()
});

/// Jobs currently running in the worker pool.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quarry_jobs_active", "Campaign jobs currently running").unwrap()
});

// =============================================================================
// Campaign Metrics
// =============================================================================

/// Duration of a full process + commit round.
pub static ROUND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "quarry_round_duration_seconds",
            "Duration of campaign processing rounds",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
        &["category"],
    )
    .unwrap()
});

/// Candidate verdicts by outcome.
pub static CANDIDATE_VERDICTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quarry_candidate_verdicts_total",
            "Candidate verdicts by outcome",
        ),
        &["verdict"], // "accepted", "pending", "rejected", "duplicate"
    )
    .unwrap()
});

/// Soft fetch errors surfaced by sources.
pub static SOURCE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_source_errors_total", "Soft source fetch errors"),
        &["source"],
    )
    .unwrap()
});

/// Campaigns retired by reason.
pub static CAMPAIGNS_RETIRED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_campaigns_retired_total", "Campaigns retired"),
        &["reason"], // "satisfied", "obsolete", "continued"
    )
    .unwrap()
});

/// Continuation campaigns created.
pub static CONTINUATIONS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quarry_continuations_created_total",
        "Continuation campaigns created",
    )
    .unwrap()
});

/// Failed commits.
pub static COMMIT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quarry_commit_failures_total",
        "Campaign commits that failed to persist",
    )
    .unwrap()
});

// =============================================================================
// Availability Gate Metrics
// =============================================================================

/// Connectivity probe results.
pub static PROBE_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_probe_results_total", "Connectivity probe results"),
        &["result"], // "online", "offline"
    )
    .unwrap()
});

/// Quota hits reported by sources.
pub static QUOTA_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quarry_quota_hits_total", "Quota or rate-limit signals"),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Scheduler
        Box::new(SCHEDULER_TICKS.clone()),
        Box::new(JOBS_DISPATCHED.clone()),
        Box::new(JOB_TIMEOUTS.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        // Campaigns
        Box::new(ROUND_DURATION.clone()),
        Box::new(CANDIDATE_VERDICTS.clone()),
        Box::new(SOURCE_ERRORS.clone()),
        Box::new(CAMPAIGNS_RETIRED.clone()),
        Box::new(CONTINUATIONS_CREATED.clone()),
        Box::new(COMMIT_FAILURES.clone()),
        // Gate
        Box::new(PROBE_RESULTS.clone()),
        Box::new(QUOTA_HITS.clone()),
    ]
}
