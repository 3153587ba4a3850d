//! Follow-up campaigns and obsolescence.
//!
//! An incremental campaign that accepts a result hands over to a new campaign
//! for the next unit (episode or season). One that stays silent long after a
//! late episode opens the next season on its own, and is dropped once that
//! season has moved on. A once campaign that never accepts anything is
//! eventually given up on.

mod config;
mod policy;
mod unit;

pub use config::ContinuationConfig;
pub use policy::ContinuationPolicy;
pub use unit::{EpisodeUnit, UnitStyle};
