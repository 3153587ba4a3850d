//! Result filtering.
//!
//! Checks are split by whether their verdict can change over time:
//! - **Dynamic** checks (seeders, settling time) may pass later; a failing
//!   candidate is left unrecorded so it is re-evaluated when it reappears.
//! - **Static** checks (size, language, trust) never change; a failing
//!   candidate is recorded as rejected and never looked at again.

mod config;
mod languages;

pub use config::{FilterConfig, ModeThresholds, SizeRange};
pub use languages::detect_languages;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::campaign::{Campaign, Category, Mode, PerCategory, PerMode};
use crate::candidate::Candidate;
use crate::config::ConfigError;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Size bounds in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeBounds {
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
}

impl SizeBounds {
    pub fn contains(&self, size_bytes: u64) -> bool {
        self.min_bytes.map_or(true, |min| size_bytes >= min)
            && self.max_bytes.map_or(true, |max| size_bytes <= max)
    }
}

impl From<SizeRange> for SizeBounds {
    fn from(range: SizeRange) -> Self {
        Self {
            min_bytes: range.min_mb.map(|mb| mb * BYTES_PER_MB),
            max_bytes: range.max_mb.map(|mb| mb * BYTES_PER_MB),
        }
    }
}

/// Why a candidate did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterReason {
    #[error("too recent (published {published_at})")]
    TooRecent { published_at: DateTime<Utc> },

    #[error("not enough seeders ({seeders} < {min})")]
    NotEnoughSeeders { seeders: u32, min: u32 },

    #[error("size does not match ({size_bytes} bytes)")]
    SizeOutOfRange { size_bytes: u64 },

    #[error("languages do not match")]
    LanguageMismatch,

    #[error("untrusted source ({source_name})")]
    Untrusted { source_name: String },
}

/// Filter decision for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Failed a dynamic check; may pass in a later round.
    Pending(FilterReason),
    /// Failed a static check; final.
    Reject(FilterReason),
}

/// Predicate set built from validated [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct ResultFilter {
    sizes: PerCategory<SizeBounds>,
    thresholds: PerMode<ModeThresholds>,
    untrusted_sources: HashSet<String>,
}

impl ResultFilter {
    /// Build the filter, failing if any category or mode has no thresholds.
    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let sizes = config.categories.try_map(|category, range| {
            range.map(SizeBounds::from).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "filters.categories.{} is required",
                    category.as_str()
                ))
            })
        })?;

        let thresholds = config.modes.try_map(|mode, thresholds| {
            thresholds.ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "filters.modes.{} is required",
                    mode.as_str()
                ))
            })
        })?;

        Ok(Self {
            sizes,
            thresholds,
            untrusted_sources: config
                .untrusted_sources
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        })
    }

    /// Size bounds for a category.
    pub fn size_bounds(&self, category: Category) -> SizeBounds {
        *self.sizes.get(category)
    }

    /// Time-sensitive checks.
    pub fn check_dynamic(
        &self,
        candidate: &Candidate,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> Result<(), FilterReason> {
        let thresholds = self.thresholds.get(mode);

        if let Some(published_at) = candidate.published_at {
            let settle = Duration::hours(thresholds.settle_hours as i64);
            if published_at > now - settle {
                return Err(FilterReason::TooRecent { published_at });
            }
        }

        if let Some(seeders) = candidate.seeders {
            if seeders < thresholds.min_seeders {
                return Err(FilterReason::NotEnoughSeeders {
                    seeders,
                    min: thresholds.min_seeders,
                });
            }
        }

        Ok(())
    }

    /// Checks whose verdict can never change for this candidate.
    pub fn check_static(
        &self,
        candidate: &Candidate,
        category: Category,
        langs: &[String],
    ) -> Result<(), FilterReason> {
        if !candidate.trusted
            || self
                .untrusted_sources
                .contains(&candidate.source.to_lowercase())
        {
            return Err(FilterReason::Untrusted {
                source_name: candidate.source.clone(),
            });
        }

        if !langs.is_empty() && !languages_match(candidate, langs) {
            return Err(FilterReason::LanguageMismatch);
        }

        if let Some(size_bytes) = candidate.size_bytes {
            if !self.sizes.get(category).contains(size_bytes) {
                return Err(FilterReason::SizeOutOfRange { size_bytes });
            }
        }

        Ok(())
    }

    /// Full verdict for a candidate within a campaign, dynamic checks first.
    pub fn evaluate(&self, candidate: &Candidate, campaign: &Campaign, now: DateTime<Utc>) -> Verdict {
        if let Err(reason) = self.check_dynamic(candidate, campaign.mode, now) {
            return Verdict::Pending(reason);
        }
        if let Err(reason) = self.check_static(candidate, campaign.category, &campaign.langs) {
            return Verdict::Reject(reason);
        }
        Verdict::Accept
    }
}

/// At least one wanted language appears in the title or the source metadata.
fn languages_match(candidate: &Candidate, langs: &[String]) -> bool {
    let detected = detect_languages(&candidate.title);
    langs.iter().any(|wanted| {
        let wanted = wanted.to_lowercase();
        detected.iter().any(|code| *code == wanted)
            || candidate
                .languages
                .iter()
                .any(|code| code.to_lowercase() == wanted)
    })
}

/// Words of a query that a result title must contain.
pub fn include_words(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Whether every include word appears as a token of `title`.
pub fn title_matches(title: &str, words: &[String]) -> bool {
    let tokens: HashSet<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    words.iter().all(|w| tokens.contains(w))
}
