//! Mock ingestor for testing.
//!
//! Canned search bodies per query and canned pages per URL, with call
//! recording and injectable failures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CrawlError, CrawlResult};
use crate::traits::ingestor::{Ingestor, RawPage};

/// Mock ingestor for testing.
///
/// Unknown queries return an empty body; unknown URLs return HTTP 404.
/// Clones share state, so a test can keep a handle while the harvester
/// owns another.
///
/// # Example
///
/// ```rust
/// use water_extraction::{MockIngestor, RawPage};
///
/// let mock = MockIngestor::new()
///     .with_search("fiji", r#"{"slug":"fiji-water","score":52}"#)
///     .with_page(RawPage::new("https://www.live-oasis.com/product/fiji-water", "<h1>Fiji</h1>"));
/// ```
#[derive(Default, Clone)]
pub struct MockIngestor {
    searches: Arc<RwLock<HashMap<String, String>>>,
    pages: Arc<RwLock<HashMap<String, RawPage>>>,
    failures: Arc<RwLock<HashMap<String, u16>>>,
    search_calls: Arc<RwLock<Vec<String>>>,
    fetch_calls: Arc<RwLock<Vec<String>>>,
}

impl MockIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned body for a search query.
    pub fn add_search(&self, query: impl Into<String>, body: impl Into<String>) {
        self.searches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.into(), body.into());
    }

    /// Canned page, keyed by its URL.
    pub fn add_page(&self, page: RawPage) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page.url.clone(), page);
    }

    /// Make a query or URL fail with the given HTTP status.
    pub fn add_failure(&self, query_or_url: impl Into<String>, status: u16) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query_or_url.into(), status);
    }

    pub fn with_search(self, query: impl Into<String>, body: impl Into<String>) -> Self {
        self.add_search(query, body);
        self
    }

    pub fn with_page(self, page: RawPage) -> Self {
        self.add_page(page);
        self
    }

    pub fn with_failure(self, query_or_url: impl Into<String>, status: u16) -> Self {
        self.add_failure(query_or_url, status);
        self
    }

    /// Queries searched so far, in call order.
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs fetched so far, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn failure(&self, key: &str) -> Option<u16> {
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }
}

#[async_trait]
impl Ingestor for MockIngestor {
    async fn search(&self, query: &str, _limit: usize) -> CrawlResult<String> {
        self.search_calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        if let Some(status) = self.failure(query) {
            return Err(CrawlError::Status {
                url: format!("search:{query}"),
                status,
            });
        }

        Ok(self
            .searches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_page(&self, url: &str) -> CrawlResult<RawPage> {
        self.fetch_calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        if let Some(status) = self.failure(url) {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }

        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| CrawlError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_responses_and_calls() {
        let mock = MockIngestor::new()
            .with_search("evian", "body")
            .with_page(RawPage::new("https://x/product/evian", "<h1>Evian</h1>"));

        assert_eq!(mock.search("evian", 40).await.unwrap(), "body");
        assert_eq!(mock.search("other", 40).await.unwrap(), "");
        assert!(mock.fetch_page("https://x/product/evian").await.is_ok());
        assert!(matches!(
            mock.fetch_page("https://x/product/none").await,
            Err(CrawlError::Status { status: 404, .. })
        ));

        assert_eq!(mock.search_calls(), vec!["evian", "other"]);
        assert_eq!(mock.fetch_call_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let mock = MockIngestor::new().with_failure("broken", 503);
        let err = mock.search("broken", 40).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mock = MockIngestor::new();
        let handle = mock.clone();
        mock.search("a", 1).await.unwrap();
        assert_eq!(handle.search_calls(), vec!["a"]);
    }
}
