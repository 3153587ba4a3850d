//! Dispatcher that holds jobs until the test runs them.

use std::sync::Mutex;
use std::time::Duration;

use crate::dispatcher::{Job, WorkDispatcher};

/// A job handed to the dispatcher.
pub struct RecordedJob {
    pub label: String,
    pub timeout: Duration,
    job: Job,
}

/// WorkDispatcher that records jobs instead of running them.
///
/// Tests decide when jobs run with [`run_all`](Self::run_all), which makes
/// tick-level assertions deterministic.
#[derive(Default)]
pub struct RecordingDispatcher {
    jobs: Mutex<Vec<RecordedJob>>,
    labels: Mutex<Vec<String>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels of every job ever enqueued, in order.
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Drop waiting jobs without running them, as a timeout would.
    pub fn abandon_all(&self) -> usize {
        let jobs: Vec<RecordedJob> = self.jobs.lock().unwrap().drain(..).collect();
        jobs.len()
    }

    /// Run every waiting job to completion, in enqueue order.
    pub async fn run_all(&self) -> usize {
        let jobs: Vec<RecordedJob> = self.jobs.lock().unwrap().drain(..).collect();
        let count = jobs.len();
        for recorded in jobs {
            recorded.job.await;
        }
        count
    }
}

impl WorkDispatcher for RecordingDispatcher {
    fn enqueue(&self, label: String, job: Job, timeout: Duration) {
        self.labels.lock().unwrap().push(label.clone());
        self.jobs
            .lock()
            .unwrap()
            .push(RecordedJob { label, timeout, job });
    }
}
