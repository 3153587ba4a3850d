//! Campaign storage trait.

use thiserror::Error;

use super::{Campaign, Category, CreateCampaignRequest};

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Campaign not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Trait for campaign storage backends.
///
/// `save` has full-document replace semantics; every campaign is written by
/// id only, so concurrent jobs on different campaigns never conflict.
pub trait CampaignStore: Send + Sync {
    /// Create a new campaign with an empty session.
    fn create(&self, request: CreateCampaignRequest) -> Result<Campaign, StoreError>;

    /// Get a campaign by ID.
    fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError>;

    /// All campaigns, never-attempted first, then oldest `last_attempt` first.
    fn list_by_last_attempt(&self) -> Result<Vec<Campaign>, StoreError>;

    /// Insert or fully replace a campaign.
    fn save(&self, campaign: &Campaign) -> Result<(), StoreError>;

    /// Delete a campaign. Returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Find a campaign with the same query (case-insensitive) and category.
    fn find_equivalent(
        &self,
        query: &str,
        category: Category,
    ) -> Result<Option<Campaign>, StoreError>;

    /// Record that `child_id` was spawned by an acceptance in `parent_id`.
    fn link_continuation(&self, parent_id: &str, child_id: &str) -> Result<(), StoreError>;

    /// IDs of campaigns spawned from `parent_id`.
    fn continuations_of(&self, parent_id: &str) -> Result<Vec<String>, StoreError>;

    /// Number of stored campaigns.
    fn count(&self) -> Result<i64, StoreError>;
}
