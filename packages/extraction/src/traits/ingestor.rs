//! Ingestor trait: the transport seam of the harvest.
//!
//! Everything that talks to the target site goes through an [`Ingestor`]
//! value constructed once with immutable configuration and passed in. The
//! pipeline never builds its own client.
//!
//! ```rust,ignore
//! use water_extraction::{HttpIngestor, Ingestor};
//!
//! let ingestor = HttpIngestor::new(&config)?;
//! let body = ingestor.search("spring", 40).await?;
//! let page = ingestor.fetch_page(&config.product_url("fiji-water")).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CrawlResult;

/// A fetched page, before extraction.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL the content was read from
    pub url: String,

    /// Response body
    pub content: String,

    /// HTTP status code
    pub status: u16,

    /// MIME type if the server sent one
    pub content_type: Option<String>,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawPage {
    /// Create a page with status 200 and no content type.
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            status: 200,
            content_type: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Check if this page has content.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Source of search bodies and product pages.
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Run one search query.
    ///
    /// Sends `[query, limit, "$undefined"]` as the JSON body and returns the
    /// raw response text. The body has no schema; parsing is the caller's job.
    async fn search(&self, query: &str, limit: usize) -> CrawlResult<String>;

    /// Fetch a single page by absolute URL.
    async fn fetch_page(&self, url: &str) -> CrawlResult<RawPage>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Ingestor + ?Sized> Ingestor for std::sync::Arc<T> {
    async fn search(&self, query: &str, limit: usize) -> CrawlResult<String> {
        (**self).search(query, limit).await
    }

    async fn fetch_page(&self, url: &str) -> CrawlResult<RawPage> {
        (**self).fetch_page(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_page_builder() {
        let page = RawPage::new("https://example.com/product/x", "<html></html>")
            .with_status(203)
            .with_content_type("text/html");
        assert_eq!(page.status, 203);
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
        assert!(page.has_content());
        assert!(!RawPage::new("u", "  \n").has_content());
    }
}
