//! Category to source routing.

use std::sync::Arc;

use crate::campaign::{Category, PerCategory};

use super::SourceAdapter;

/// Maps every category to the source that serves it.
#[derive(Clone)]
pub struct SourceRouter {
    sources: PerCategory<Arc<dyn SourceAdapter>>,
}

impl SourceRouter {
    pub fn new(sources: PerCategory<Arc<dyn SourceAdapter>>) -> Self {
        Self { sources }
    }

    /// One source for every category.
    pub fn uniform(source: Arc<dyn SourceAdapter>) -> Self {
        Self::new(PerCategory {
            movie: Arc::clone(&source),
            tv_episode: Arc::clone(&source),
            music_album: Arc::clone(&source),
            generic: source,
        })
    }

    pub fn source_for(&self, category: Category) -> &Arc<dyn SourceAdapter> {
        self.sources.get(category)
    }

    pub fn source_name(&self, category: Category) -> &str {
        self.source_for(category).name()
    }
}
