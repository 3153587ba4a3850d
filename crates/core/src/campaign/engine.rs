//! Campaign rounds: validate, process, commit.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::candidate::{Candidate, CandidateRecord, CandidateStore};
use crate::continuation::{ContinuationConfig, ContinuationPolicy};
use crate::filter::{include_words, ResultFilter, Verdict};
use crate::gate::AvailabilityGate;
use crate::inventory::InventoryProbe;
use crate::metrics;
use crate::source::{QueryFilters, SourceError, SourceQuery, SourceRouter};

use super::{
    Campaign, CampaignStore, Eligibility, Mode, PolicyConfig, RetireReason, StoreError,
};

/// Errors that abort a campaign operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// What a `process` call produced, consumed by `commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Source queried in this round.
    pub source: String,
    /// Dedup keys of the candidates accepted this round.
    pub accepted: Vec<String>,
    /// The round ended early on a quota signal.
    pub quota_hit: bool,
}

/// Result of committing a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved,
    Retired(RetireReason),
}

/// Round tunables that are not thresholds of the filter.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub policy: PolicyConfig,
    pub continuation: ContinuationConfig,
    /// Pages requested from a source once a campaign has widened its search.
    pub page_budget_max: u32,
}

/// Drives campaigns through their rounds.
pub struct CampaignEngine {
    campaigns: Arc<dyn CampaignStore>,
    candidates: Arc<dyn CandidateStore>,
    sources: SourceRouter,
    inventory: Arc<dyn InventoryProbe>,
    gate: Arc<AvailabilityGate>,
    filter: ResultFilter,
    continuation: ContinuationPolicy,
    policy: PolicyConfig,
    page_budget_max: u32,
}

impl CampaignEngine {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        candidates: Arc<dyn CandidateStore>,
        sources: SourceRouter,
        inventory: Arc<dyn InventoryProbe>,
        gate: Arc<AvailabilityGate>,
        filter: ResultFilter,
        settings: EngineSettings,
    ) -> Self {
        let continuation =
            ContinuationPolicy::new(settings.continuation, settings.policy.obsolete_after());
        Self {
            campaigns,
            candidates,
            sources,
            inventory,
            gate,
            filter,
            continuation,
            policy: settings.policy,
            page_budget_max: settings.page_budget_max,
        }
    }

    pub fn campaigns(&self) -> &Arc<dyn CampaignStore> {
        &self.campaigns
    }

    pub fn candidates(&self) -> &Arc<dyn CandidateStore> {
        &self.candidates
    }

    /// Name of the source serving a campaign's category.
    pub fn source_name(&self, campaign: &Campaign) -> &str {
        self.sources.source_name(campaign.category)
    }

    fn query_filters(&self, campaign: &Campaign) -> QueryFilters {
        QueryFilters {
            include: include_words(&campaign.query),
            langs: campaign.langs.clone(),
            size: self.filter.size_bounds(campaign.category),
        }
    }

    fn retire(&self, campaign: &Campaign, reason: RetireReason) -> Result<Eligibility, EngineError> {
        self.campaigns.delete(&campaign.id)?;
        metrics::CAMPAIGNS_RETIRED
            .with_label_values(&[reason.as_str()])
            .inc();
        info!(
            "Retired {} campaign {} ({:?}): {}",
            campaign.category.as_str(),
            campaign.id,
            campaign.query,
            reason.as_str()
        );
        Ok(Eligibility::Retired(reason))
    }

    /// Decide whether `campaign` should run a round at `now`.
    ///
    /// Retired campaigns are deleted from the store before returning.
    pub async fn validate(
        &self,
        campaign: &mut Campaign,
        now: DateTime<Utc>,
    ) -> Result<Eligibility, EngineError> {
        // Continuous campaigns have no single item to be satisfied by.
        if campaign.mode != Mode::Continuous && self.local_check_due(campaign, now) {
            let filters = self.query_filters(campaign);
            let satisfied = match self
                .inventory
                .exists(&campaign.query, campaign.category, &filters)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    warn!("Inventory probe failed for campaign {}: {}", campaign.id, e);
                    false
                }
            };

            if satisfied {
                if campaign.mode == Mode::Incremental {
                    self.continuation
                        .continue_from(self.campaigns.as_ref(), campaign, now)?;
                }
                return self.retire(campaign, RetireReason::Satisfied);
            }

            campaign.session.last_local_check = Some(now);
            self.campaigns.save(campaign)?;
        }

        if self.continuation.is_obsolete(campaign, now) {
            return self.retire(campaign, RetireReason::Obsolete);
        }

        if self
            .continuation
            .season_ended(self.campaigns.as_ref(), campaign, now)?
        {
            return self.retire(campaign, RetireReason::SeasonEnded);
        }

        let session = &campaign.session;
        if let Some(last_attempt) = session.last_attempt {
            if now - last_attempt < self.policy.min_interval(campaign.mode) {
                return Ok(Eligibility::NotDue);
            }
        }

        if campaign.mode != Mode::Once {
            let active_since = session.last_success.or(session.first_attempt);
            let idle = active_since.is_some_and(|t| now - t > self.policy.idle_window());
            let retried_recently = session
                .last_attempt
                .is_some_and(|t| now - t < self.policy.idle_retry());
            if idle && retried_recently {
                return Ok(Eligibility::NotDue);
            }
        }

        if let Err(e) = self
            .continuation
            .roll_over(self.campaigns.as_ref(), campaign, now)
        {
            warn!(campaign = %campaign.id, "Failed to open next season: {}", e);
        }

        Ok(Eligibility::Due)
    }

    fn local_check_due(&self, campaign: &Campaign, now: DateTime<Utc>) -> bool {
        campaign
            .session
            .last_local_check
            .map_or(true, |t| now - t >= self.policy.local_check_interval())
    }

    /// Query the campaign's source and act on each candidate.
    ///
    /// Never fails: fetch problems are counted in the session, and a quota
    /// signal ends the round early.
    pub async fn process(&self, campaign: &mut Campaign, now: DateTime<Utc>) -> RoundOutcome {
        campaign.session.begin_round(self.page_budget_max);

        let source = self.sources.source_for(campaign.category);
        let query = SourceQuery {
            term: campaign.query.clone(),
            category: campaign.category,
            sort: campaign.session.sort_strategy,
            page_budget: campaign.session.page_budget,
            filters: self.query_filters(campaign),
        };

        debug!(
            campaign = %campaign.id,
            source = source.name(),
            sort = query.sort.as_str(),
            pages = query.page_budget,
            "Processing {:?}",
            campaign.query
        );

        let mut outcome = RoundOutcome {
            source: source.name().to_string(),
            ..Default::default()
        };

        let mut stream = source.query(&query);
        while let Some(item) = stream.next().await {
            let flow = match item {
                Ok(candidate) => self.handle_candidate(campaign, candidate, &mut outcome, now),
                Err(e) => self.handle_error(campaign, e, &mut outcome).await,
            };
            if flow.is_break() {
                break;
            }
        }

        outcome
    }

    async fn handle_error(
        &self,
        campaign: &mut Campaign,
        error: SourceError,
        outcome: &mut RoundOutcome,
    ) -> ControlFlow<()> {
        match error {
            SourceError::Quota { source_name } => {
                self.gate.report_quota_hit(&source_name).await;
                outcome.quota_hit = true;
                ControlFlow::Break(())
            }
            SourceError::Page { .. } => {
                campaign.session.error_count += 1;
                metrics::SOURCE_ERRORS
                    .with_label_values(&[outcome.source.as_str()])
                    .inc();
                debug!(campaign = %campaign.id, "Soft source error: {}", error);
                ControlFlow::Continue(())
            }
        }
    }

    fn handle_candidate(
        &self,
        campaign: &mut Campaign,
        candidate: Candidate,
        outcome: &mut RoundOutcome,
        now: DateTime<Utc>,
    ) -> ControlFlow<()> {
        let Some(key) = candidate.dedup_key() else {
            campaign.session.error_count += 1;
            debug!(campaign = %campaign.id, "Candidate {:?} has no dedup key", candidate.title);
            return ControlFlow::Continue(());
        };

        match self.candidates.is_recorded(&campaign.id, &key) {
            Ok(true) => {
                metrics::CANDIDATE_VERDICTS
                    .with_label_values(&["duplicate"])
                    .inc();
                return ControlFlow::Continue(());
            }
            Ok(false) => {}
            Err(e) => {
                campaign.session.error_count += 1;
                warn!(campaign = %campaign.id, "Failed to check candidate {}: {}", key, e);
                return ControlFlow::Continue(());
            }
        }

        campaign.session.results_seen += 1;

        match self.filter.evaluate(&candidate, campaign, now) {
            Verdict::Pending(reason) => {
                campaign.session.pending_count += 1;
                metrics::CANDIDATE_VERDICTS
                    .with_label_values(&["pending"])
                    .inc();
                debug!(campaign = %campaign.id, "Pending {:?}: {}", candidate.title, reason);
                ControlFlow::Continue(())
            }
            Verdict::Reject(reason) => {
                metrics::CANDIDATE_VERDICTS
                    .with_label_values(&["rejected"])
                    .inc();
                debug!(campaign = %campaign.id, "Rejected {:?}: {}", candidate.title, reason);
                let record =
                    CandidateRecord::rejected(&campaign.id, key, &candidate, reason.to_string(), now);
                if let Err(e) = self.candidates.record(&record) {
                    warn!(campaign = %campaign.id, "Failed to record rejected candidate: {}", e);
                }
                ControlFlow::Continue(())
            }
            Verdict::Accept => self.accept(campaign, key, &candidate, outcome, now),
        }
    }

    fn accept(
        &self,
        campaign: &mut Campaign,
        key: String,
        candidate: &Candidate,
        outcome: &mut RoundOutcome,
        now: DateTime<Utc>,
    ) -> ControlFlow<()> {
        let record = CandidateRecord::accepted(&campaign.id, key.clone(), candidate, now);
        match self.candidates.record(&record) {
            Ok(true) => {}
            Ok(false) => return ControlFlow::Continue(()),
            Err(e) => {
                campaign.session.error_count += 1;
                warn!(campaign = %campaign.id, "Failed to record accepted candidate: {}", e);
                return ControlFlow::Continue(());
            }
        }

        campaign.session.accepted_count += 1;
        campaign.session.processed_count += 1;
        outcome.accepted.push(key);
        metrics::CANDIDATE_VERDICTS
            .with_label_values(&["accepted"])
            .inc();
        info!(
            "Accepted {:?} from {} for campaign {} ({:?})",
            candidate.title, candidate.source, campaign.id, campaign.query
        );

        if campaign.mode == Mode::Incremental {
            if let Err(e) = self
                .continuation
                .continue_from(self.campaigns.as_ref(), campaign, now)
            {
                warn!(campaign = %campaign.id, "Failed to create continuation: {}", e);
            }
        }

        if campaign.mode.stops_on_first_accept() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Persist the round. An incremental campaign that accepted something is
    /// removed instead, its continuation having taken over.
    pub fn commit(
        &self,
        campaign: &mut Campaign,
        outcome: &RoundOutcome,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, EngineError> {
        if campaign.mode == Mode::Incremental && !outcome.accepted.is_empty() {
            self.retire(campaign, RetireReason::Continued)?;
            return Ok(CommitOutcome::Retired(RetireReason::Continued));
        }

        let session = &mut campaign.session;
        if session.first_attempt.is_none() {
            session.first_attempt = Some(now);
        }
        if session.error_count <= 1 {
            session.last_attempt = Some(now);
        }
        if session.accepted_count > 0 {
            session.last_success = Some(now);
        }

        self.campaigns.save(campaign)?;
        Ok(CommitOutcome::Saved)
    }

    /// Full round for a campaign already judged due: process then commit.
    pub async fn run_round(&self, mut campaign: Campaign) -> Result<CommitOutcome, EngineError> {
        let started = Instant::now();
        let outcome = self.process(&mut campaign, Utc::now()).await;
        let result = self.commit(&mut campaign, &outcome, Utc::now());

        metrics::ROUND_DURATION
            .with_label_values(&[campaign.category.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(_) => debug!(
                campaign = %campaign.id,
                seen = campaign.session.results_seen,
                pending = campaign.session.pending_count,
                errors = campaign.session.error_count,
                accepted = campaign.session.accepted_count,
                "Round committed"
            ),
            Err(e) => {
                metrics::COMMIT_FAILURES.inc();
                warn!("Failed to commit campaign {}: {}", campaign.id, e);
            }
        }

        result
    }
}
