//! Scheduler lifecycle integration tests.
//!
//! These drive campaigns through full ticks (validate, dispatch, process,
//! commit) against SQLite stores and mock collaborators.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use quarry_core::{
    source::SourceError,
    testing::{fixtures, MockInventory, MockProbe, MockSource, RecordingDispatcher},
    AvailabilityGate, CampaignEngine, CampaignStore, CandidateStore, Category,
    CreateCampaignRequest, Disposition, EngineSettings, Mode, PoolDispatcher, Scheduler,
    SchedulerConfig, SortStrategy, SourceRouter, SqliteCampaignStore, SqliteCandidateStore,
    WorkDispatcher,
};

/// Test helper wiring a scheduler around file-backed stores.
struct TestHarness {
    scheduler: Arc<Scheduler>,
    campaigns: Arc<SqliteCampaignStore>,
    candidates: Arc<SqliteCandidateStore>,
    source: Arc<MockSource>,
    inventory: Arc<MockInventory>,
    gate: Arc<AvailabilityGate>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new(workers_limit: usize, dispatcher: Arc<dyn WorkDispatcher>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let campaigns =
            Arc::new(SqliteCampaignStore::new(&db_path).expect("Failed to create campaign store"));
        let candidates = Arc::new(
            SqliteCandidateStore::new(&db_path).expect("Failed to create candidate store"),
        );
        let source = Arc::new(MockSource::new("mock"));
        let inventory = Arc::new(MockInventory::new());
        let gate = Arc::new(AvailabilityGate::new(
            Arc::new(MockProbe::new(true)),
            Duration::hours(12),
        ));

        let engine = Arc::new(CampaignEngine::new(
            campaigns.clone(),
            candidates.clone(),
            SourceRouter::uniform(source.clone()),
            inventory.clone(),
            gate.clone(),
            fixtures::result_filter(),
            EngineSettings {
                page_budget_max: 5,
                ..Default::default()
            },
        ));

        let config = SchedulerConfig {
            workers_limit,
            ..Default::default()
        };
        let scheduler = Arc::new(Scheduler::new(config, engine, gate.clone(), dispatcher));

        Self {
            scheduler,
            campaigns,
            candidates,
            source,
            inventory,
            gate,
            _temp_dir: temp_dir,
        }
    }

    fn with_recorder(workers_limit: usize) -> (Self, Arc<RecordingDispatcher>) {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        (Self::new(workers_limit, dispatcher.clone()), dispatcher)
    }

    fn create(&self, query: &str, category: Category, mode: Mode) -> String {
        self.campaigns
            .create(CreateCampaignRequest::new(query, category, mode))
            .expect("Failed to create campaign")
            .id
    }
}

#[tokio::test]
async fn test_once_campaign_until_satisfied() {
    let (h, dispatcher) = TestHarness::with_recorder(5);
    let id = h.create("Some Movie 2010", Category::Movie, Mode::Once);

    h.source
        .add_results(vec![
            Ok(fixtures::candidate("Some Movie 2010 CAM", "small", 100)),
            Ok(fixtures::candidate("Some Movie 2010 1080p", "good", 1400)),
            Ok(fixtures::candidate("Some Movie 2010 720p", "later", 900)),
        ])
        .await;

    let start = Utc::now();
    assert_eq!(h.scheduler.tick_at(start).await.dispatched, 1);
    assert_eq!(dispatcher.run_all().await, 1);

    // Too small is rejected, the first good one accepted, and the round stops.
    let records = h.candidates.list_for_campaign(&id).unwrap();
    assert_eq!(records.len(), 2);
    let accepted: Vec<_> = records
        .iter()
        .filter(|r| r.disposition == Disposition::Accepted)
        .collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].dedup_key, "good");

    let campaign = h.campaigns.get(&id).unwrap().expect("campaign kept");
    assert!(campaign.session.last_success.is_some());
    assert_eq!(campaign.session.processed_count, 1);

    // Inside the minimum interval nothing is dispatched.
    let report = h.scheduler.tick_at(start + Duration::hours(1)).await;
    assert_eq!(report.considered, 1);
    assert_eq!(report.dispatched, 0);

    // Once the item shows up locally the campaign is deleted.
    h.inventory.set_present("Some Movie 2010").await;
    let report = h.scheduler.tick_at(start + Duration::hours(5)).await;
    assert_eq!(report.retired, 1);
    assert!(h.campaigns.get(&id).unwrap().is_none());
    assert_eq!(h.campaigns.count().unwrap(), 0);
}

#[tokio::test]
async fn test_incremental_campaign_hands_over_to_next_episode() {
    let (h, dispatcher) = TestHarness::with_recorder(5);
    let id = h.create("Some Show S01E01", Category::TvEpisode, Mode::Incremental);

    h.source
        .add_results(vec![Ok(fixtures::candidate(
            "Some Show S01E01 720p",
            "ep1",
            400,
        ))])
        .await;

    h.scheduler.tick().await;
    dispatcher.run_all().await;

    assert!(h.campaigns.get(&id).unwrap().is_none());
    let next = h
        .campaigns
        .find_equivalent("Some Show S01E02", Category::TvEpisode)
        .unwrap()
        .expect("continuation created");
    assert_eq!(next.mode, Mode::Incremental);
    assert_eq!(h.campaigns.count().unwrap(), 1);
    assert_eq!(h.campaigns.continuations_of(&id).unwrap(), vec![next.id.clone()]);

    // The continuation runs on the next tick and finds nothing yet.
    assert_eq!(h.scheduler.tick().await.dispatched, 1);
    dispatcher.run_all().await;

    let next = h.campaigns.get(&next.id).unwrap().expect("still searching");
    assert!(next.session.first_attempt.is_some());
    assert!(next.session.last_success.is_none());
    assert_eq!(h.campaigns.count().unwrap(), 1);
}

#[tokio::test]
async fn test_satisfied_incremental_campaign_continues_once() {
    let (h, _dispatcher) = TestHarness::with_recorder(5);
    h.create("Some Show S02E05", Category::TvEpisode, Mode::Incremental);
    h.create("Some Show S02E06", Category::TvEpisode, Mode::Incremental);
    h.inventory.set_present("Some Show S02E05").await;

    let report = h.scheduler.tick().await;
    assert_eq!(report.retired, 1);

    // The successor already existed, so nothing new is created.
    assert_eq!(h.campaigns.count().unwrap(), 1);
    assert!(h
        .campaigns
        .find_equivalent("Some Show S02E06", Category::TvEpisode)
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_continuous_campaign_never_reaccepts_a_result() {
    let (h, dispatcher) = TestHarness::with_recorder(5);
    let id = h.create("Some Artist", Category::MusicAlbum, Mode::Continuous);

    h.source
        .add_results(vec![
            Ok(fixtures::candidate("Some Artist - First", "a1", 100)),
            Ok(fixtures::candidate("Some Artist - Second", "a2", 120)),
        ])
        .await;
    h.source
        .add_results(vec![
            Ok(fixtures::candidate("Some Artist - First", "A1", 100)),
            Ok(fixtures::candidate("Some Artist - Second", "a2", 120)),
            Ok(fixtures::candidate("Some Artist - Third", "a3", 90)),
        ])
        .await;

    let start = Utc::now();
    h.scheduler.tick_at(start).await;
    dispatcher.run_all().await;
    assert_eq!(h.candidates.list_for_campaign(&id).unwrap().len(), 2);

    // Continuous campaigns are never checked against the inventory.
    h.inventory.set_present("Some Artist").await;

    assert_eq!(
        h.scheduler.tick_at(start + Duration::hours(7)).await.dispatched,
        1
    );
    dispatcher.run_all().await;

    let records = h.candidates.list_for_campaign(&id).unwrap();
    assert_eq!(records.len(), 3);
    assert!(h.inventory.calls().await.is_empty());

    let campaign = h.campaigns.get(&id).unwrap().expect("campaign kept");
    assert_eq!(campaign.session.accepted_count, 1);
    assert_eq!(campaign.session.processed_count, 3);
    assert_eq!(campaign.session.results_seen, 1);
}

#[tokio::test]
async fn test_query_shape_follows_previous_round() {
    let (h, dispatcher) = TestHarness::with_recorder(5);
    h.create("Quiet Movie", Category::Movie, Mode::Once);

    // First round: newest page only.
    let start = Utc::now();
    h.scheduler.tick_at(start).await;
    dispatcher.run_all().await;

    // Second round after an empty first round: still narrow. It sees a
    // result that is too fresh to judge.
    let mut fresh = fixtures::candidate("Quiet Movie 1080p", "fresh", 1400);
    fresh.published_at = Some(Utc::now() - Duration::hours(1));
    h.source.add_results(vec![Ok(fresh)]).await;
    h.scheduler.tick_at(start + Duration::hours(5)).await;
    dispatcher.run_all().await;

    // Third round after a pending result: wide.
    h.scheduler.tick_at(start + Duration::hours(10)).await;
    dispatcher.run_all().await;

    let queries = h.source.queries().await;
    assert_eq!(queries.len(), 3);
    assert_eq!(
        (queries[0].sort, queries[0].page_budget),
        (SortStrategy::Recency, 1)
    );
    assert_eq!(
        (queries[1].sort, queries[1].page_budget),
        (SortStrategy::Recency, 1)
    );
    assert_eq!(
        (queries[2].sort, queries[2].page_budget),
        (SortStrategy::Popularity, 5)
    );
}

#[tokio::test]
async fn test_quota_hit_pauses_source() {
    let (h, dispatcher) = TestHarness::with_recorder(5);
    h.create("Movie A", Category::Movie, Mode::Once);
    h.create("Movie B", Category::Movie, Mode::Once);

    h.source
        .add_results(vec![Err(SourceError::Quota {
            source_name: "mock".to_string(),
        })])
        .await;

    let start = Utc::now();
    let first = h.scheduler.tick_at(start).await;
    assert_eq!(first.dispatched, 2);
    dispatcher.run_all().await;

    let status = h.gate.status().await;
    assert_eq!(status.cooldowns.len(), 1);
    assert_eq!(status.cooldowns[0].source, "mock");

    let cooling = h.scheduler.tick_at(start + Duration::hours(5)).await;
    assert_eq!(cooling.cooling_down, 2);
    assert_eq!(cooling.dispatched, 0);

    let resumed = h.scheduler.tick_at(start + Duration::hours(13)).await;
    assert_eq!(resumed.dispatched, 2);
    assert!(h.gate.status().await.cooldowns.is_empty());
}

#[tokio::test]
async fn test_obsolete_campaign_is_dropped() {
    let (h, _dispatcher) = TestHarness::with_recorder(5);
    let id = h.create("Forgotten Movie", Category::Movie, Mode::Once);

    let mut campaign = h.campaigns.get(&id).unwrap().unwrap();
    let now = Utc::now();
    campaign.session.first_attempt = Some(now - Duration::days(100));
    campaign.session.last_attempt = Some(now - Duration::days(1));
    h.campaigns.save(&campaign).unwrap();

    let report = h.scheduler.tick_at(now).await;
    assert_eq!(report.retired, 1);
    assert!(h.campaigns.get(&id).unwrap().is_none());
}

#[tokio::test]
async fn test_pool_dispatcher_runs_rounds() {
    let pool = Arc::new(PoolDispatcher::new(2));
    let h = TestHarness::new(2, pool.clone());
    h.source.set_delay(StdDuration::from_millis(50)).await;

    let ids: Vec<_> = (0..4)
        .map(|i| h.create(&format!("Movie {}", i), Category::Movie, Mode::Once))
        .collect();

    let report = h.scheduler.tick().await;
    assert_eq!(report.dispatched, 2);

    // Wait for both rounds to commit.
    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(5);
    loop {
        let status = h.scheduler.status().await;
        if status.in_flight == 0 && pool.status().total_completed == 2 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "rounds never finished");
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }

    let attempted = ids
        .iter()
        .filter_map(|id| h.campaigns.get(id).unwrap())
        .filter(|c| c.session.last_attempt.is_some())
        .count();
    assert_eq!(attempted, 2);
    assert_eq!(pool.status().total_completed, 2);

    // The two untried campaigns sort first now.
    assert_eq!(h.scheduler.tick().await.dispatched, 2);
}
