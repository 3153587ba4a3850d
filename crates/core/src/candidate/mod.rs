//! Candidate results and their write-once records.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteCandidateStore;
pub use store::CandidateStore;
pub use types::{Candidate, CandidateRecord, Disposition};
