//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator the engine and scheduler talk to, so rounds
//! and ticks can be exercised without network or filesystem access.
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_core::testing::{fixtures, MockInventory, MockProbe, MockSource, RecordingDispatcher};
//!
//! let source = MockSource::new("mock");
//! let inventory = MockInventory::new();
//! let dispatcher = RecordingDispatcher::new();
//!
//! source.add_results(vec![Ok(fixtures::candidate("Movie 2010", "abc", 700))]).await;
//! inventory.set_present("Other Movie").await;
//!
//! // Build an engine and scheduler around them...
//! ```

mod mock_inventory;
mod mock_source;
mod recording_dispatcher;

pub use mock_inventory::{MockInventory, MockProbe};
pub use mock_source::{Batch, MockSource};
pub use recording_dispatcher::{RecordedJob, RecordingDispatcher};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::campaign::{PerCategory, PerMode};
    use crate::candidate::Candidate;
    use crate::filter::{FilterConfig, ModeThresholds, ResultFilter, SizeRange};

    /// A candidate that passes every filter for its size: trusted, seeded,
    /// published two days ago, deduplicated by `info_hash`.
    pub fn candidate(title: &str, info_hash: &str, size_mb: u64) -> Candidate {
        let mut candidate = Candidate::new(title, "mock");
        candidate.info_hash = Some(info_hash.to_string());
        candidate.url = Some(format!("magnet:?xt=urn:btih:{}", info_hash));
        candidate.size_bytes = Some(size_mb * 1024 * 1024);
        candidate.seeders = Some(50);
        candidate.published_at = Some(Utc::now() - Duration::hours(48));
        candidate
    }

    /// Filter thresholds for every category and mode.
    pub fn filter_config() -> FilterConfig {
        let range = |min_mb, max_mb| {
            Some(SizeRange {
                min_mb: Some(min_mb),
                max_mb: Some(max_mb),
            })
        };
        let thresholds = |min_seeders, settle_hours| {
            Some(ModeThresholds {
                min_seeders,
                settle_hours,
            })
        };
        FilterConfig {
            categories: PerCategory {
                movie: range(600, 2000),
                tv_episode: range(100, 1000),
                music_album: range(40, 200),
                generic: Some(SizeRange::default()),
            },
            modes: PerMode {
                once: thresholds(0, 24),
                incremental: thresholds(10, 12),
                continuous: thresholds(1, 24),
            },
            untrusted_sources: Vec::new(),
        }
    }

    pub fn result_filter() -> ResultFilter {
        match ResultFilter::from_config(&filter_config()) {
            Ok(filter) => filter,
            Err(e) => panic!("fixture filter config is incomplete: {}", e),
        }
    }

    /// The `[filters]` section matching [`filter_config`], for config files.
    pub const FILTERS_TOML: &str = r#"
[filters.categories.movie]
min_mb = 600
max_mb = 2000

[filters.categories.tv_episode]
min_mb = 100
max_mb = 1000

[filters.categories.music_album]
min_mb = 40
max_mb = 200

[filters.categories.generic]

[filters.modes.once]
min_seeders = 0
settle_hours = 24

[filters.modes.incremental]
min_seeders = 10
settle_hours = 12

[filters.modes.continuous]
min_seeders = 1
settle_hours = 24
"#;
}
