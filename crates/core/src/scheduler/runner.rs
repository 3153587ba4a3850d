//! Campaign scheduler implementation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::campaign::{Campaign, CampaignEngine, CommitOutcome, Eligibility};
use crate::dispatcher::WorkDispatcher;
use crate::gate::AvailabilityGate;
use crate::metrics;

use super::config::SchedulerConfig;
use super::types::{SchedulerStatus, TickReport};

type InFlight = Arc<Mutex<HashSet<String>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<String>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a campaign as running until dropped, including when the job future
/// is dropped on timeout.
struct InFlightGuard {
    in_flight: InFlight,
    campaign_id: String,
}

impl InFlightGuard {
    fn acquire(in_flight: &InFlight, campaign_id: &str) -> Self {
        lock(in_flight).insert(campaign_id.to_string());
        Self {
            in_flight: Arc::clone(in_flight),
            campaign_id: campaign_id.to_string(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.campaign_id);
    }
}

/// Periodically selects due campaigns and dispatches their rounds.
pub struct Scheduler {
    config: SchedulerConfig,
    engine: Arc<CampaignEngine>,
    gate: Arc<AvailabilityGate>,
    dispatcher: Arc<dyn WorkDispatcher>,

    // Runtime state
    in_flight: InFlight,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        engine: Arc<CampaignEngine>,
        gate: Arc<AvailabilityGate>,
        dispatcher: Arc<dyn WorkDispatcher>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            engine,
            gate,
            dispatcher,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the tick loop in the background.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(self.config.tick_interval_secs);

        tokio::spawn(async move {
            info!(
                interval_secs = interval.as_secs(),
                workers = this.config.workers_limit,
                "Scheduler loop started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !this.running.load(Ordering::Relaxed) {
                            break;
                        }
                        this.tick().await;
                    }
                }
            }
            info!("Scheduler loop stopped");
        });
    }

    /// Stop the tick loop. Jobs already dispatched run to completion.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());
    }

    pub async fn status(&self) -> SchedulerStatus {
        let running = self.running.load(Ordering::Relaxed);
        let in_flight = lock(&self.in_flight).len();
        SchedulerStatus {
            running,
            in_flight,
            gate: self.gate.status().await,
        }
    }

    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as of `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport {
            online: self.gate.refresh().await,
            ..Default::default()
        };

        if !report.online {
            debug!("Offline, skipping tick");
            metrics::SCHEDULER_TICKS
                .with_label_values(&[report.outcome()])
                .inc();
            return report;
        }

        match self.engine.campaigns().list_by_last_attempt() {
            Ok(campaigns) => self.select_and_dispatch(campaigns, now, &mut report).await,
            Err(e) => warn!("Failed to list campaigns: {}", e),
        }

        report.purged = self.purge(now);

        metrics::SCHEDULER_TICKS
            .with_label_values(&[report.outcome()])
            .inc();
        if report.dispatched > 0 || report.retired > 0 {
            info!(
                considered = report.considered,
                retired = report.retired,
                dispatched = report.dispatched,
                in_flight = report.in_flight,
                "Tick complete"
            );
        }

        report
    }

    async fn select_and_dispatch(
        &self,
        campaigns: Vec<Campaign>,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        let running = lock(&self.in_flight).len();
        let capacity = self.config.workers_limit.saturating_sub(running);

        for mut campaign in campaigns {
            if report.dispatched >= capacity {
                break;
            }

            if lock(&self.in_flight).contains(&campaign.id) {
                report.in_flight += 1;
                continue;
            }

            let source = self.engine.source_name(&campaign).to_string();
            if !self.gate.is_source_available_at(&source, now).await {
                report.cooling_down += 1;
                continue;
            }

            report.considered += 1;
            match self.engine.validate(&mut campaign, now).await {
                Ok(Eligibility::Due) => {
                    self.dispatch(campaign);
                    report.dispatched += 1;
                }
                Ok(Eligibility::NotDue) => {}
                Ok(Eligibility::Retired(_)) => report.retired += 1,
                Err(e) => warn!("Failed to validate campaign {}: {}", campaign.id, e),
            }
        }
    }

    fn dispatch(&self, campaign: Campaign) {
        let guard = InFlightGuard::acquire(&self.in_flight, &campaign.id);
        let engine = Arc::clone(&self.engine);
        let label = format!("campaign {} ({})", campaign.id, campaign.query);

        let job = async move {
            let _guard = guard;
            let id = campaign.id.clone();
            match engine.run_round(campaign).await {
                Ok(CommitOutcome::Saved) => debug!(campaign = %id, "Round saved"),
                Ok(CommitOutcome::Retired(reason)) => {
                    debug!(campaign = %id, reason = reason.as_str(), "Round retired campaign")
                }
                // Already logged and counted by the engine.
                Err(_) => {}
            }
        }
        .boxed();

        self.dispatcher.enqueue(
            label,
            job,
            Duration::from_secs(self.config.job_timeout_secs),
        );
    }

    fn purge(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::days(self.config.result_retention_days as i64);
        match self.engine.candidates().purge_older_than(cutoff) {
            Ok(0) => 0,
            Ok(removed) => {
                info!(removed = removed, "Purged old candidate records");
                removed
            }
            Err(e) => {
                warn!("Failed to purge candidate records: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{
        CampaignStore, Category, CreateCampaignRequest, EngineSettings, Mode, SqliteCampaignStore,
    };
    use crate::candidate::{CandidateRecord, CandidateStore, SqliteCandidateStore};
    use crate::source::SourceRouter;
    use crate::testing::{fixtures, MockInventory, MockProbe, MockSource, RecordingDispatcher};

    struct Harness {
        scheduler: Arc<Scheduler>,
        campaigns: Arc<SqliteCampaignStore>,
        candidates: Arc<SqliteCandidateStore>,
        source: Arc<MockSource>,
        probe: Arc<MockProbe>,
        gate: Arc<AvailabilityGate>,
        dispatcher: Arc<RecordingDispatcher>,
    }

    fn harness(workers_limit: usize) -> Harness {
        let campaigns = Arc::new(SqliteCampaignStore::in_memory().unwrap());
        let candidates = Arc::new(SqliteCandidateStore::in_memory().unwrap());
        let source = Arc::new(MockSource::new("mock"));
        let probe = Arc::new(MockProbe::new(true));
        let gate = Arc::new(AvailabilityGate::new(
            probe.clone(),
            chrono::Duration::hours(12),
        ));
        let engine = Arc::new(CampaignEngine::new(
            campaigns.clone(),
            candidates.clone(),
            SourceRouter::uniform(source.clone()),
            Arc::new(MockInventory::new()),
            gate.clone(),
            fixtures::result_filter(),
            EngineSettings {
                page_budget_max: 20,
                ..Default::default()
            },
        ));
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let config = SchedulerConfig {
            workers_limit,
            ..Default::default()
        };
        let scheduler = Arc::new(Scheduler::new(
            config,
            engine,
            gate.clone(),
            dispatcher.clone(),
        ));
        Harness {
            scheduler,
            campaigns,
            candidates,
            source,
            probe,
            gate,
            dispatcher,
        }
    }

    fn create(h: &Harness, query: &str) -> Campaign {
        h.campaigns
            .create(CreateCampaignRequest::new(query, Category::Movie, Mode::Once))
            .unwrap()
    }

    #[tokio::test]
    async fn test_offline_tick_does_nothing() {
        let h = harness(5);
        create(&h, "Movie A");
        h.probe.set_reachable(false).await;

        let report = h.scheduler.tick().await;
        assert!(!report.online);
        assert_eq!(report.considered, 0);
        assert_eq!(h.dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_bounded_by_workers_limit() {
        let h = harness(2);
        for i in 0..5 {
            create(&h, &format!("Movie {}", i));
        }

        let report = h.scheduler.tick().await;
        assert_eq!(report.dispatched, 2);
        assert_eq!(h.dispatcher.pending(), 2);
        assert_eq!(h.scheduler.status().await.in_flight, 2);
    }

    #[tokio::test]
    async fn test_in_flight_campaigns_are_not_redispatched() {
        let h = harness(5);
        create(&h, "Movie A");

        assert_eq!(h.scheduler.tick().await.dispatched, 1);

        // Job has not run yet.
        let second = h.scheduler.tick().await;
        assert_eq!(second.dispatched, 0);
        assert_eq!(second.in_flight, 1);

        // A dropped job releases its campaign.
        assert_eq!(h.dispatcher.abandon_all(), 1);
        assert_eq!(h.scheduler.status().await.in_flight, 0);
        assert_eq!(h.scheduler.tick().await.dispatched, 1);
    }

    #[tokio::test]
    async fn test_committed_campaign_waits_for_min_interval() {
        let h = harness(5);
        let c = create(&h, "Movie A");

        let now = Utc::now();
        assert_eq!(h.scheduler.tick_at(now).await.dispatched, 1);
        assert_eq!(h.dispatcher.run_all().await, 1);
        assert_eq!(h.source.query_count().await, 1);

        let stored = h.campaigns.get(&c.id).unwrap().unwrap();
        let last_attempt = stored.session.last_attempt.unwrap();

        let soon = last_attempt + chrono::Duration::hours(3);
        assert_eq!(h.scheduler.tick_at(soon).await.dispatched, 0);

        let later = last_attempt + chrono::Duration::hours(4);
        assert_eq!(h.scheduler.tick_at(later).await.dispatched, 1);
    }

    #[tokio::test]
    async fn test_cooling_source_is_skipped() {
        let h = harness(5);
        create(&h, "Movie A");
        let now = Utc::now();
        h.gate.report_quota_hit_at("mock", now).await;

        let report = h.scheduler.tick_at(now).await;
        assert_eq!(report.cooling_down, 1);
        assert_eq!(report.dispatched, 0);

        let after = now + chrono::Duration::hours(12);
        assert_eq!(h.scheduler.tick_at(after).await.dispatched, 1);
    }

    #[tokio::test]
    async fn test_never_attempted_campaigns_go_first() {
        let h = harness(1);
        let old = create(&h, "Attempted");
        let mut attempted = old.clone();
        attempted.session.first_attempt = Some(Utc::now() - chrono::Duration::days(1));
        attempted.session.last_attempt = Some(Utc::now() - chrono::Duration::hours(5));
        h.campaigns.save(&attempted).unwrap();
        let fresh = create(&h, "Fresh");

        h.scheduler.tick().await;
        let labels = h.dispatcher.labels();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].contains(&fresh.id));
    }

    #[tokio::test]
    async fn test_tick_purges_old_records() {
        let h = harness(5);
        let now = Utc::now();
        let candidate = fixtures::candidate("Old", "old", 700);
        h.candidates
            .record(&CandidateRecord::accepted(
                "gone",
                "old".to_string(),
                &candidate,
                now - chrono::Duration::days(121),
            ))
            .unwrap();

        let report = h.scheduler.tick_at(now).await;
        assert_eq!(report.purged, 1);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let h = harness(5);
        h.scheduler.start();
        assert!(h.scheduler.status().await.running);
        h.scheduler.stop();
        assert!(!h.scheduler.status().await.running);
    }
}
