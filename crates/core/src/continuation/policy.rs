use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::campaign::{Campaign, CampaignStore, CreateCampaignRequest, Mode, StoreError};
use crate::metrics;

use super::{ContinuationConfig, EpisodeUnit};

/// Decides what follows an acceptance, and when a campaign is not worth
/// pursuing any more.
#[derive(Debug, Clone)]
pub struct ContinuationPolicy {
    config: ContinuationConfig,
    obsolete_after: Duration,
}

impl ContinuationPolicy {
    pub fn new(config: ContinuationConfig, obsolete_after: Duration) -> Self {
        Self {
            config,
            obsolete_after,
        }
    }

    /// A once campaign that never accepted anything within the obsolescence
    /// window, counted from its first attempt (or creation if it never ran).
    pub fn is_obsolete(&self, campaign: &Campaign, now: DateTime<Utc>) -> bool {
        if campaign.mode != Mode::Once {
            return false;
        }
        let session = &campaign.session;
        if session.last_success.is_some() || session.processed_count > 0 {
            return false;
        }
        let since = session.first_attempt.unwrap_or(campaign.created_at);
        now - since > self.obsolete_after
    }

    /// Query for the campaign that should follow `campaign`, if any.
    pub fn next_query(&self, campaign: &Campaign, now: DateTime<Utc>) -> Option<String> {
        if campaign.mode != Mode::Incremental {
            return None;
        }
        let unit = EpisodeUnit::parse(&campaign.query)?;

        let age = now - campaign.created_at;
        let next = if unit.episode > self.config.season_rollover_episode
            && age > Duration::days(self.config.season_rollover_days as i64)
        {
            unit.next_season()
        } else {
            unit.next_episode()
        };

        Some(next.apply_to(&campaign.query))
    }

    /// Next-season query for an incremental campaign whose season looks
    /// finished: past the rollover episode and first attempted longer ago
    /// than the rollover window. Needs no acceptance.
    pub fn rollover_query(&self, campaign: &Campaign, now: DateTime<Utc>) -> Option<String> {
        if campaign.mode != Mode::Incremental {
            return None;
        }
        let first_attempt = campaign.session.first_attempt?;
        let unit = EpisodeUnit::parse(&campaign.query)?;
        if unit.episode <= self.config.season_rollover_episode
            || now - first_attempt <= Duration::days(self.config.season_rollover_days as i64)
        {
            return None;
        }
        Some(unit.next_season().apply_to(&campaign.query))
    }

    /// Whether the next season of a stale campaign has already moved past its
    /// first episode, leaving nothing for `campaign` to wait for.
    pub fn season_ended(
        &self,
        store: &dyn CampaignStore,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(next_season) = self.rollover_query(campaign, now) else {
            return Ok(false);
        };
        let Some(unit) = EpisodeUnit::parse(&next_season) else {
            return Ok(false);
        };
        let second_episode = unit.next_episode().apply_to(&next_season);
        Ok(store
            .find_equivalent(&second_episode, campaign.category)?
            .is_some())
    }

    /// Create the follow-up campaign for `campaign` unless an equivalent one
    /// already exists. Returns the created campaign.
    pub fn continue_from(
        &self,
        store: &dyn CampaignStore,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Result<Option<Campaign>, StoreError> {
        let Some(query) = self.next_query(campaign, now) else {
            debug!(
                "No continuation for campaign {} ({:?})",
                campaign.id, campaign.query
            );
            return Ok(None);
        };
        self.spawn(store, campaign, query)
    }

    /// Open the next season for a stale campaign, keeping the campaign
    /// itself alive in case the current season is still airing.
    pub fn roll_over(
        &self,
        store: &dyn CampaignStore,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Result<Option<Campaign>, StoreError> {
        match self.rollover_query(campaign, now) {
            Some(query) => self.spawn(store, campaign, query),
            None => Ok(None),
        }
    }

    fn spawn(
        &self,
        store: &dyn CampaignStore,
        campaign: &Campaign,
        query: String,
    ) -> Result<Option<Campaign>, StoreError> {
        if let Some(existing) = store.find_equivalent(&query, campaign.category)? {
            debug!(
                "Continuation {:?} already covered by campaign {}",
                query, existing.id
            );
            return Ok(None);
        }

        let request = CreateCampaignRequest::new(query, campaign.category, campaign.mode)
            .with_langs(campaign.langs.clone());
        let child = store.create(request)?;
        store.link_continuation(&campaign.id, &child.id)?;

        metrics::CONTINUATIONS_CREATED.inc();
        info!(
            "Campaign {} continued as {} ({:?})",
            campaign.id, child.id, child.query
        );

        Ok(Some(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{Category, SqliteCampaignStore};

    fn policy() -> ContinuationPolicy {
        ContinuationPolicy::new(ContinuationConfig::default(), Duration::days(90))
    }

    fn campaign(query: &str, mode: Mode, created_at: DateTime<Utc>) -> Campaign {
        Campaign {
            id: "parent".to_string(),
            query: query.to_string(),
            category: Category::TvEpisode,
            mode,
            langs: vec!["fr".to_string()],
            created_at,
            session: Default::default(),
        }
    }

    #[test]
    fn test_next_episode_for_recent_campaign() {
        let now = Utc::now();
        let c = campaign("Show S01E05", Mode::Incremental, now - Duration::days(3));
        assert_eq!(policy().next_query(&c, now).as_deref(), Some("Show S01E06"));
    }

    #[test]
    fn test_next_season_for_stale_campaign() {
        let now = Utc::now();
        let c = campaign("Show S01E05", Mode::Incremental, now - Duration::days(61));
        assert_eq!(policy().next_query(&c, now).as_deref(), Some("Show S02E01"));

        // Early episodes always continue within the season.
        let early = campaign("Show S01E02", Mode::Incremental, now - Duration::days(61));
        assert_eq!(
            policy().next_query(&early, now).as_deref(),
            Some("Show S01E03")
        );
    }

    #[test]
    fn test_no_continuation_outside_incremental_mode() {
        let now = Utc::now();
        let c = campaign("Show S01E05", Mode::Once, now);
        assert!(policy().next_query(&c, now).is_none());
    }

    #[test]
    fn test_continue_from_creates_and_links_once() {
        let store = SqliteCampaignStore::in_memory().unwrap();
        let now = Utc::now();
        let parent = campaign("Show S01E05", Mode::Incremental, now);

        let child = policy()
            .continue_from(&store, &parent, now)
            .unwrap()
            .unwrap();
        assert_eq!(child.query, "Show S01E06");
        assert_eq!(child.mode, Mode::Incremental);
        assert_eq!(child.langs, vec!["fr".to_string()]);
        assert_eq!(store.continuations_of("parent").unwrap(), vec![child.id]);

        // Equivalent campaign exists now.
        let again = policy().continue_from(&store, &parent, now).unwrap();
        assert!(again.is_none());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_unparseable_query_yields_nothing() {
        let store = SqliteCampaignStore::in_memory().unwrap();
        let now = Utc::now();
        let parent = campaign("Show complete series", Mode::Incremental, now);
        assert!(policy().continue_from(&store, &parent, now).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_obsolescence() {
        let now = Utc::now();
        let mut c = campaign("Movie", Mode::Once, now - Duration::days(100));
        c.session.first_attempt = Some(now - Duration::days(91));
        assert!(policy().is_obsolete(&c, now));

        c.session.first_attempt = Some(now - Duration::days(89));
        assert!(!policy().is_obsolete(&c, now));

        c.session.first_attempt = Some(now - Duration::days(91));
        c.session.last_success = Some(now - Duration::days(50));
        assert!(!policy().is_obsolete(&c, now));

        let continuous = campaign("Movie", Mode::Continuous, now - Duration::days(400));
        assert!(!policy().is_obsolete(&continuous, now));
    }

    #[test]
    fn test_rollover_needs_late_episode_and_old_first_attempt() {
        let now = Utc::now();
        let mut c = campaign("Show S01E11", Mode::Incremental, now - Duration::days(70));
        assert!(policy().rollover_query(&c, now).is_none());

        c.session.first_attempt = Some(now - Duration::days(59));
        assert!(policy().rollover_query(&c, now).is_none());

        c.session.first_attempt = Some(now - Duration::days(70));
        assert_eq!(
            policy().rollover_query(&c, now).as_deref(),
            Some("Show S02E01")
        );

        let early = Campaign {
            query: "Show S01E02".to_string(),
            ..c.clone()
        };
        assert!(policy().rollover_query(&early, now).is_none());
    }

    #[test]
    fn test_roll_over_once_then_season_ends() {
        let store = SqliteCampaignStore::in_memory().unwrap();
        let now = Utc::now();
        let mut stale = campaign("Show S01E11", Mode::Incremental, now - Duration::days(70));
        stale.session.first_attempt = Some(now - Duration::days(70));

        let child = policy().roll_over(&store, &stale, now).unwrap().unwrap();
        assert_eq!(child.query, "Show S02E01");
        assert!(policy().roll_over(&store, &stale, now).unwrap().is_none());
        assert!(!policy().season_ended(&store, &stale, now).unwrap());

        store
            .create(CreateCampaignRequest::new(
                "Show S02E02",
                Category::TvEpisode,
                Mode::Incremental,
            ))
            .unwrap();
        assert!(policy().season_ended(&store, &stale, now).unwrap());
    }
}
