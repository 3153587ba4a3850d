//! Core campaign data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Classification
// ============================================================================

/// Kind of media a campaign is looking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Movie,
    TvEpisode,
    MusicAlbum,
    Generic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Movie,
        Category::TvEpisode,
        Category::MusicAlbum,
        Category::Generic,
    ];

    /// Stable string form, used for storage and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::TvEpisode => "tv_episode",
            Category::MusicAlbum => "music_album",
            Category::Generic => "generic",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Lifecycle policy of a campaign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Acquire a single item, then wait for it to show up locally.
    Once,
    /// Acquire one unit, then hand over to a campaign for the next unit.
    Incremental,
    /// Keep collecting every qualifying result indefinitely.
    Continuous,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Once, Mode::Incremental, Mode::Continuous];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Once => "once",
            Mode::Incremental => "incremental",
            Mode::Continuous => "continuous",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Whether the first accepted result ends the scan of a round.
    pub fn stops_on_first_accept(&self) -> bool {
        !matches!(self, Mode::Continuous)
    }
}

/// Ordering requested from a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    #[default]
    Recency,
    Popularity,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::Recency => "recency",
            SortStrategy::Popularity => "popularity",
        }
    }
}

// ============================================================================
// Per-variant tables
// ============================================================================

/// One value per [`Category`], looked up with an exhaustive match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct PerCategory<T> {
    #[serde(default)]
    pub movie: T,
    #[serde(default)]
    pub tv_episode: T,
    #[serde(default)]
    pub music_album: T,
    #[serde(default)]
    pub generic: T,
}

impl<T> PerCategory<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Movie => &self.movie,
            Category::TvEpisode => &self.tv_episode,
            Category::MusicAlbum => &self.music_album,
            Category::Generic => &self.generic,
        }
    }

    /// Map every entry, failing on the first error.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Category, &T) -> Result<U, E>,
    ) -> Result<PerCategory<U>, E> {
        Ok(PerCategory {
            movie: f(Category::Movie, &self.movie)?,
            tv_episode: f(Category::TvEpisode, &self.tv_episode)?,
            music_album: f(Category::MusicAlbum, &self.music_album)?,
            generic: f(Category::Generic, &self.generic)?,
        })
    }
}

/// One value per [`Mode`], looked up with an exhaustive match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct PerMode<T> {
    #[serde(default)]
    pub once: T,
    #[serde(default)]
    pub incremental: T,
    #[serde(default)]
    pub continuous: T,
}

impl<T> PerMode<T> {
    pub fn get(&self, mode: Mode) -> &T {
        match mode {
            Mode::Once => &self.once,
            Mode::Incremental => &self.incremental,
            Mode::Continuous => &self.continuous,
        }
    }

    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Mode, &T) -> Result<U, E>,
    ) -> Result<PerMode<U>, E> {
        Ok(PerMode {
            once: f(Mode::Once, &self.once)?,
            incremental: f(Mode::Incremental, &self.incremental)?,
            continuous: f(Mode::Continuous, &self.continuous)?,
        })
    }
}

// ============================================================================
// Campaign
// ============================================================================

/// Scheduling state owned by the engine.
///
/// Timestamps survive across rounds. The round counters (`results_seen`,
/// `pending_count`, `error_count`, `accepted_count`) describe the most
/// recently committed round and are reset when a new round begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_attempt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_local_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results_seen: u32,
    #[serde(default)]
    pub pending_count: u32,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub accepted_count: u32,
    /// Lifetime number of accepted results.
    #[serde(default)]
    pub processed_count: u64,
    #[serde(default)]
    pub sort_strategy: SortStrategy,
    #[serde(default = "default_page_budget")]
    pub page_budget: u32,
}

fn default_page_budget() -> u32 {
    1
}

impl SessionState {
    /// Whether at least one round has been committed.
    pub fn has_run(&self) -> bool {
        self.first_attempt.is_some()
    }

    /// Query shape for the next round.
    ///
    /// A round that saw nothing, left nothing pending and hit no errors means
    /// the campaign is narrow: keep polling the newest page only. Anything else
    /// widens the search to the most popular results over `max_pages`.
    pub fn next_query_shape(&self, max_pages: u32) -> (SortStrategy, u32) {
        if !self.has_run()
            || (self.results_seen == 0 && self.pending_count == 0 && self.error_count == 0)
        {
            (SortStrategy::Recency, 1)
        } else {
            (SortStrategy::Popularity, max_pages.max(1))
        }
    }

    /// Pick the query shape and reset the round counters.
    pub fn begin_round(&mut self, max_pages: u32) {
        let (sort, pages) = self.next_query_shape(max_pages);
        self.sort_strategy = sort;
        self.page_budget = pages;
        self.results_seen = 0;
        self.pending_count = 0;
        self.error_count = 0;
        self.accepted_count = 0;
    }
}

/// A standing request to find and acquire an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: String,
    /// Search term, e.g. "Some Show S02E04".
    pub query: String,
    pub category: Category,
    pub mode: Mode,
    /// ISO 639-1 codes; any one of them must be present in a result.
    #[serde(default)]
    pub langs: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub session: SessionState,
}

/// Request to create a new campaign.
#[derive(Debug, Clone)]
pub struct CreateCampaignRequest {
    pub query: String,
    pub category: Category,
    pub mode: Mode,
    pub langs: Vec<String>,
}

impl CreateCampaignRequest {
    pub fn new(query: impl Into<String>, category: Category, mode: Mode) -> Self {
        Self {
            query: query.into(),
            category,
            mode,
            langs: Vec::new(),
        }
    }

    pub fn with_langs(mut self, langs: Vec<String>) -> Self {
        self.langs = langs;
        self
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// Why a campaign was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetireReason {
    /// Local inventory already holds the item.
    Satisfied,
    /// Once-mode campaign that never accepted anything in time.
    Obsolete,
    /// Incremental campaign handed over to the next unit.
    Continued,
    /// Stale incremental campaign whose next season is already under way.
    SeasonEnded,
}

impl RetireReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetireReason::Satisfied => "satisfied",
            RetireReason::Obsolete => "obsolete",
            RetireReason::Continued => "continued",
            RetireReason::SeasonEnded => "season_ended",
        }
    }
}

/// Outcome of validating a campaign at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Due,
    NotDue,
    Retired(RetireReason),
}
