//! Paged JSON search endpoint.

use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::filter::title_matches;

use super::{SourceAdapter, SourceError, SourceItem, SourceQuery};

/// Configuration for an HTTP JSON source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used in logs, metrics and cooldowns.
    pub name: String,
    /// Search endpoint, e.g. "http://localhost:9117/api/search".
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SourceItem>,
}

/// Source backed by a JSON search endpoint returning one page per request.
///
/// Request: `GET {url}?q=..&category=..&sort=..&page=N` plus optional size,
/// language and API key parameters. Response: `{"results": [...]}`. An empty
/// page ends the scan early; HTTP 429 is reported as a quota error.
pub struct HttpJsonSource {
    client: Client,
    config: SourceConfig,
}

impl HttpJsonSource {
    pub fn new(config: SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;
        Ok(Self { client, config })
    }

    fn build_page_url(&self, query: &SourceQuery, page: u32) -> String {
        let mut url = format!(
            "{}?q={}&category={}&sort={}&page={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&query.term),
            query.category.as_str(),
            query.sort.as_str(),
            page
        );

        if let Some(min) = query.filters.size.min_bytes {
            url.push_str(&format!("&min_size={}", min));
        }
        if let Some(max) = query.filters.size.max_bytes {
            url.push_str(&format!("&max_size={}", max));
        }
        for lang in &query.filters.langs {
            url.push_str(&format!("&lang={}", urlencoding::encode(lang)));
        }
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&apikey={}", urlencoding::encode(key)));
        }

        url
    }

    async fn fetch_page(
        &self,
        query: &SourceQuery,
        page: u32,
    ) -> Result<Vec<SourceItem>, SourceError> {
        let url = self.build_page_url(query, page);
        debug!(source = %self.config.name, page = page, "Fetching search page");

        let page_error = |message: String| SourceError::Page { page, message };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| page_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Quota {
                source_name: self.config.name.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(page_error(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: SearchPage = response
            .json()
            .await
            .map_err(|e| page_error(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.results)
    }

    fn to_candidates(&self, items: Vec<SourceItem>, include: &[String]) -> Vec<Candidate> {
        items
            .into_iter()
            .map(|item| item.into_candidate(&self.config.name))
            .filter(|c| title_matches(&c.title, include))
            .collect()
    }
}

impl SourceAdapter for HttpJsonSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn query<'a>(
        &'a self,
        query: &'a SourceQuery,
    ) -> BoxStream<'a, Result<Candidate, SourceError>> {
        let last_page = query.page_budget.max(1);

        stream::unfold(Some(1u32), move |next| async move {
            let page = next.filter(|p| *p <= last_page)?;
            match self.fetch_page(query, page).await {
                Ok(items) if items.is_empty() => Some((Vec::new(), None)),
                Ok(items) => {
                    let batch = self
                        .to_candidates(items, &query.filters.include)
                        .into_iter()
                        .map(Ok)
                        .collect();
                    Some((batch, Some(page + 1)))
                }
                Err(e @ SourceError::Quota { .. }) => Some((vec![Err(e)], None)),
                Err(e) => {
                    warn!(source = %self.config.name, error = %e, "Search page failed");
                    Some((vec![Err(e)], Some(page + 1)))
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}
