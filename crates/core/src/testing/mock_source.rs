//! Mock source adapter for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;

use crate::candidate::Candidate;
use crate::source::{SourceAdapter, SourceError, SourceQuery};

/// Items returned by one query.
pub type Batch = Vec<Result<Candidate, SourceError>>;

/// Mock implementation of the SourceAdapter trait.
///
/// Each query consumes the next configured batch; once the batches run out
/// queries return nothing. Every query is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use quarry_core::testing::{fixtures, MockSource};
///
/// let source = MockSource::new("mock");
/// source.add_results(vec![Ok(fixtures::candidate("Movie 2010", "abc", 700))]).await;
///
/// // ... run a round ...
///
/// assert_eq!(source.queries().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockSource {
    name: String,
    batches: Arc<RwLock<VecDeque<Batch>>>,
    queries: Arc<RwLock<Vec<SourceQuery>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batches: Arc::new(RwLock::new(VecDeque::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Queue the items returned by the next unanswered query.
    pub async fn add_results(&self, batch: Batch) {
        self.batches.write().await.push_back(batch);
    }

    /// Make every query wait before yielding anything.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Queries received so far.
    pub async fn queries(&self) -> Vec<SourceQuery> {
        self.queries.read().await.clone()
    }

    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

impl SourceAdapter for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query<'a>(
        &'a self,
        query: &'a SourceQuery,
    ) -> BoxStream<'a, Result<Candidate, SourceError>> {
        stream::once(async move {
            self.queries.write().await.push(query.clone());
            let delay = *self.delay.read().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.batches.write().await.pop_front().unwrap_or_default()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}
