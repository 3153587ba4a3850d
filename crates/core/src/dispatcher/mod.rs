//! Bounded background work dispatch.
//!
//! The scheduler hands each due campaign's round to a [`WorkDispatcher`] and
//! moves on; it never waits for a job to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::metrics;

/// A unit of background work.
pub type Job = BoxFuture<'static, ()>;

/// Fire-and-forget job execution with a per-job timeout.
pub trait WorkDispatcher: Send + Sync {
    /// Schedule `job`. If it has not finished within `timeout` it is dropped.
    fn enqueue(&self, label: String, job: Job, timeout: Duration);
}

/// Snapshot of the worker pool.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PoolStatus {
    pub active_jobs: usize,
    pub max_concurrent: usize,
    pub queued_jobs: usize,
    pub total_completed: u64,
    pub total_timed_out: u64,
}

#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_timed_out: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            max_concurrent,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_timed_out: self.total_timed_out.load(Ordering::Relaxed),
        }
    }
}

/// Dispatcher running jobs on the tokio runtime, at most `max_concurrent` at
/// a time. The timeout covers only the run, not the wait for a slot.
pub struct PoolDispatcher {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    stats: Arc<PoolStats>,
}

impl PoolDispatcher {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.max_concurrent)
    }
}

impl WorkDispatcher for PoolDispatcher {
    fn enqueue(&self, label: String, job: Job, timeout: Duration) {
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);

        stats.queued.fetch_add(1, Ordering::Relaxed);
        metrics::JOBS_DISPATCHED.inc();

        tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            let Ok(_permit) = permit else {
                warn!(job = %label, "Worker pool closed, dropping job");
                return;
            };

            stats.active.fetch_add(1, Ordering::Relaxed);
            metrics::JOBS_ACTIVE.inc();

            match tokio::time::timeout(timeout, job).await {
                Ok(()) => {
                    stats.total_completed.fetch_add(1, Ordering::Relaxed);
                    debug!(job = %label, "Job finished");
                }
                Err(_) => {
                    stats.total_timed_out.fetch_add(1, Ordering::Relaxed);
                    metrics::JOB_TIMEOUTS.inc();
                    warn!(job = %label, timeout_secs = timeout.as_secs(), "Job timed out, abandoned");
                }
            }

            stats.active.fetch_sub(1, Ordering::Relaxed);
            metrics::JOBS_ACTIVE.dec();
        });
    }
}
