//! Source adapter types.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::campaign::{Category, SortStrategy};
use crate::candidate::Candidate;
use crate::filter::SizeBounds;

/// Narrowing hints passed to a source along with the search term.
///
/// Sources may apply them server-side, client-side or not at all; the engine
/// filters every candidate again regardless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    /// Words every result title must contain.
    pub include: Vec<String>,
    /// Wanted languages (ISO 639-1).
    pub langs: Vec<String>,
    pub size: SizeBounds,
}

/// A search request sent to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub term: String,
    pub category: Category,
    pub sort: SortStrategy,
    /// Maximum number of pages to fetch.
    pub page_budget: u32,
    pub filters: QueryFilters,
}

/// Errors surfaced inline by a source stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// A page could not be fetched or parsed. Later pages may still succeed.
    #[error("page {page} failed: {message}")]
    Page { page: u32, message: String },

    /// The source refuses further requests for now.
    #[error("quota exceeded for source {source_name}")]
    Quota { source_name: String },
}

/// A search backend.
///
/// `query` returns a finite, one-shot stream of candidates in source order.
/// Page-level failures appear as items in the stream rather than ending it,
/// except [`SourceError::Quota`] which is always the last item.
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn query<'a>(
        &'a self,
        query: &'a SourceQuery,
    ) -> BoxStream<'a, Result<Candidate, SourceError>>;
}

/// One result as returned by a JSON search endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceItem {
    pub title: String,
    #[serde(default)]
    pub info_hash: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub seeders: Option<u32>,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub trusted: Option<bool>,
}

impl SourceItem {
    pub fn into_candidate(self, source: &str) -> Candidate {
        Candidate {
            title: self.title,
            source: source.to_string(),
            info_hash: self.info_hash,
            url: self.url,
            size_bytes: self.size,
            seeders: self.seeders,
            published_at: self.published_at,
            languages: self.languages,
            trusted: self.trusted.unwrap_or(true),
        }
    }
}
