//! Result filter configuration.

use serde::{Deserialize, Serialize};

use crate::campaign::{PerCategory, PerMode};

/// Accepted size range for a category, in megabytes. Either bound may be open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SizeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mb: Option<u64>,
}

/// Time-sensitive thresholds for a mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeThresholds {
    /// Minimum seeders a result must have when the source reports them.
    pub min_seeders: u32,
    /// Minimum age of a result before it may be accepted.
    pub settle_hours: u64,
}

/// Filter thresholds.
///
/// Every category and every mode must be configured; there are no built-in
/// defaults and a missing entry is rejected at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FilterConfig {
    #[serde(default)]
    pub categories: PerCategory<Option<SizeRange>>,
    #[serde(default)]
    pub modes: PerMode<Option<ModeThresholds>>,
    /// Source names whose results are never accepted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub untrusted_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{Category, Mode};

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            untrusted_sources = ["shady"]

            [categories.movie]
            min_mb = 600
            max_mb = 2000

            [categories.tv_episode]
            min_mb = 100
            max_mb = 1000

            [categories.music_album]
            min_mb = 40

            [categories.generic]

            [modes.once]
            min_seeders = 0
            settle_hours = 24

            [modes.incremental]
            min_seeders = 10
            settle_hours = 12

            [modes.continuous]
            min_seeders = 1
            settle_hours = 24
        "#;
        let config: FilterConfig = toml::from_str(toml).unwrap();

        assert_eq!(
            *config.categories.get(Category::Movie),
            Some(SizeRange {
                min_mb: Some(600),
                max_mb: Some(2000)
            })
        );
        assert_eq!(
            config.categories.get(Category::MusicAlbum).unwrap().max_mb,
            None
        );
        assert_eq!(*config.categories.get(Category::Generic), Some(SizeRange::default()));
        assert_eq!(config.modes.get(Mode::Incremental).unwrap().min_seeders, 10);
        assert_eq!(config.untrusted_sources, vec!["shady"]);
    }

    #[test]
    fn test_deserialize_partial_leaves_gaps() {
        let toml = r#"
            [modes.once]
            min_seeders = 0
            settle_hours = 24
        "#;
        let config: FilterConfig = toml::from_str(toml).unwrap();
        assert!(config.modes.get(Mode::Once).is_some());
        assert!(config.modes.get(Mode::Continuous).is_none());
        assert!(config.categories.get(Category::Movie).is_none());
    }
}
