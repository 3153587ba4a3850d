//! Candidate record storage trait.

use chrono::{DateTime, Utc};

use super::CandidateRecord;
use crate::campaign::StoreError;

/// Trait for candidate record storage backends.
pub trait CandidateStore: Send + Sync {
    /// Whether `dedup_key` has already been recorded for the campaign.
    fn is_recorded(&self, campaign_id: &str, dedup_key: &str) -> Result<bool, StoreError>;

    /// Record a candidate. Returns `false` if the key was already recorded,
    /// in which case the existing record is left untouched.
    fn record(&self, record: &CandidateRecord) -> Result<bool, StoreError>;

    /// All records for a campaign, oldest first.
    fn list_for_campaign(&self, campaign_id: &str) -> Result<Vec<CandidateRecord>, StoreError>;

    /// Accepted records not yet picked up downstream, oldest first.
    fn list_actionable(&self, limit: i64) -> Result<Vec<CandidateRecord>, StoreError>;

    /// Set the processed marker on a record.
    fn mark_processed(
        &self,
        campaign_id: &str,
        dedup_key: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete records created before `cutoff`. Returns how many were removed.
    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
