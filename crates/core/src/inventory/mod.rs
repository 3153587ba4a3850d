//! Local inventory probe.
//!
//! Answers "do we already have this?" before a campaign spends a round on
//! its source.

mod config;

pub use config::InventoryConfig;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::campaign::Category;
use crate::filter::title_matches;
use crate::source::QueryFilters;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Checks local storage for an item.
#[async_trait]
pub trait InventoryProbe: Send + Sync {
    /// Whether the item described by `term` is already available locally.
    async fn exists(
        &self,
        term: &str,
        category: Category,
        filters: &QueryFilters,
    ) -> Result<bool, InventoryError>;
}

/// Inventory backed by directory trees on the local filesystem.
///
/// A file matches when its path below the root contains every include word
/// of the query. The item exists once the number of matching files reaches
/// the category minimum.
pub struct FsInventory {
    config: InventoryConfig,
}

impl FsInventory {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }

    /// Count matching files under `root`, stopping at `enough`.
    async fn count_matches(
        root: &Path,
        words: &[String],
        enough: u32,
    ) -> Result<u32, InventoryError> {
        let mut found = 0;
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|source| InventoryError::Io {
                path: dir.clone(),
                source,
            })?;

            loop {
                let entry = entries.next_entry().await.map_err(|source| InventoryError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let Some(entry) = entry else { break };

                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|source| InventoryError::Io {
                    path: path.clone(),
                    source,
                })?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let relative = path.strip_prefix(root).unwrap_or(&path);
                if title_matches(&relative.to_string_lossy(), words) {
                    found += 1;
                    if found >= enough {
                        return Ok(found);
                    }
                }
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl InventoryProbe for FsInventory {
    async fn exists(
        &self,
        term: &str,
        category: Category,
        filters: &QueryFilters,
    ) -> Result<bool, InventoryError> {
        if filters.include.is_empty() {
            return Ok(false);
        }

        let needed = self.config.min_files_for(category).max(1);
        let mut found = 0;

        for root in &self.config.roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "Inventory root missing, skipping");
                continue;
            }
            found += Self::count_matches(root, &filters.include, needed - found).await?;
            if found >= needed {
                debug!(term = term, files = found, "Found in local inventory");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::include_words;
    use tempfile::TempDir;

    fn filters(term: &str) -> QueryFilters {
        QueryFilters {
            include: include_words(term),
            ..Default::default()
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn inventory(roots: Vec<PathBuf>) -> FsInventory {
        FsInventory::new(InventoryConfig {
            roots,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_finds_episode_in_nested_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tv/Some Show/Season 1/Some.Show.S01E02.720p.mkv");

        let inv = inventory(vec![dir.path().to_path_buf()]);
        let term = "Some Show S01E02";
        assert!(inv
            .exists(term, Category::TvEpisode, &filters(term))
            .await
            .unwrap());

        let other = "Some Show S01E03";
        assert!(!inv
            .exists(other, Category::TvEpisode, &filters(other))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_music_needs_several_tracks() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Artist - Album/01 Intro.mp3");
        touch(dir.path(), "Artist - Album/02 Song.mp3");

        let inv = inventory(vec![dir.path().to_path_buf()]);
        let term = "Artist Album";
        assert!(!inv
            .exists(term, Category::MusicAlbum, &filters(term))
            .await
            .unwrap());

        touch(dir.path(), "Artist - Album/03 Outro.mp3");
        assert!(inv
            .exists(term, Category::MusicAlbum, &filters(term))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Movie.2010.mkv");

        let inv = inventory(vec![
            PathBuf::from("/nonexistent/quarry/root"),
            dir.path().to_path_buf(),
        ]);
        let term = "Movie 2010";
        assert!(inv.exists(term, Category::Movie, &filters(term)).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_query_never_matches() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "anything.mkv");

        let inv = inventory(vec![dir.path().to_path_buf()]);
        assert!(!inv
            .exists("", Category::Generic, &QueryFilters::default())
            .await
            .unwrap());
    }
}
