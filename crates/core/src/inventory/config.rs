//! Local inventory configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::campaign::{Category, PerCategory};

/// Where local media lives and how much of it satisfies a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryConfig {
    /// Directories searched recursively.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Matching files needed per category. Unset entries use the built-in
    /// minimum (3 for music albums, 1 otherwise).
    #[serde(default)]
    pub min_files: PerCategory<Option<u32>>,
}

impl InventoryConfig {
    pub fn min_files_for(&self, category: Category) -> u32 {
        self.min_files.get(category).unwrap_or(match category {
            Category::MusicAlbum => 3,
            Category::Movie | Category::TvEpisode | Category::Generic => 1,
        })
    }
}
