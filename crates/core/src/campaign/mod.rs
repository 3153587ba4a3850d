//! Campaigns: standing requests to find and acquire an item.
//!
//! A campaign moves through rounds driven by the [`CampaignEngine`]:
//! `validate` decides whether it is due (or retires it), `process` queries its
//! source and filters the results, `commit` persists the outcome.

mod config;
mod engine;
mod sqlite_store;
mod store;
mod types;

pub use config::PolicyConfig;
pub use engine::{CampaignEngine, CommitOutcome, EngineError, EngineSettings, RoundOutcome};
pub use sqlite_store::SqliteCampaignStore;
pub use store::{CampaignStore, StoreError};
pub use types::*;
