//! Campaign scheduler.
//!
//! Every tick the scheduler checks connectivity, walks the campaigns from the
//! least recently attempted, validates them and dispatches the due ones to a
//! bounded worker pool. Jobs run independently of the tick loop.

mod config;
mod runner;
mod types;

pub use config::SchedulerConfig;
pub use runner::Scheduler;
pub use types::{SchedulerStatus, TickReport};
