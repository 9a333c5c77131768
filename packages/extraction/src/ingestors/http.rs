//! HTTP ingestor for the target site.
//!
//! One `reqwest::Client` is built from immutable configuration and reused
//! for every request. Transient failures are retried with exponential
//! backoff; anything else is returned on the first attempt.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use std::future::Future;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CrawlError, CrawlResult};
use crate::traits::ingestor::{Ingestor, RawPage};
use crate::types::config::{HarvestConfig, RetryPolicy};

/// Cursor sentinel the search endpoint expects as its third argument.
const SEARCH_CURSOR: &str = "$undefined";

const MAX_REDIRECTS: usize = 5;

/// HTTP ingestor speaking the site's search and product page contracts.
///
/// # Example
///
/// ```rust,ignore
/// use water_extraction::{HarvestConfig, HttpIngestor, RateLimitedIngestor};
///
/// let config = HarvestConfig::default();
/// let ingestor = RateLimitedIngestor::new(HttpIngestor::new(&config)?, config.requests_per_second);
/// ```
pub struct HttpIngestor {
    client: reqwest::Client,
    search_url: String,
    retry: RetryPolicy,
}

impl HttpIngestor {
    /// Build the client from `config`.
    pub fn new(config: &HarvestConfig) -> CrawlResult<Self> {
        let search_url = config.search_url();
        Url::parse(&search_url).map_err(|_| CrawlError::InvalidUrl {
            url: search_url.clone(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(browser_headers())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| CrawlError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            search_url,
            retry: config.retry,
        })
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post_search(&self, query: &str, limit: usize) -> CrawlResult<String> {
        let payload = serde_json::json!([query, limit, SEARCH_CURSOR]);
        let response = self
            .client
            .post(&self.search_url)
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| CrawlError::from_reqwest(&self.search_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: self.search_url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| CrawlError::from_reqwest(&self.search_url, e))
    }

    async fn get_page(&self, url: &str) -> CrawlResult<RawPage> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let html = response
            .text()
            .await
            .map_err(|e| CrawlError::from_reqwest(url, e))?;

        let mut page = RawPage::new(final_url, html)
            .with_status(status.as_u16())
            .with_fetched_at(Utc::now());
        if let Some(ct) = content_type {
            page = page.with_content_type(ct);
        }
        Ok(page)
    }
}

#[async_trait]
impl Ingestor for HttpIngestor {
    async fn search(&self, query: &str, limit: usize) -> CrawlResult<String> {
        retry_transient(&self.retry, &self.search_url, || self.post_search(query, limit)).await
    }

    async fn fetch_page(&self, url: &str) -> CrawlResult<RawPage> {
        Url::parse(url).map_err(|_| CrawlError::InvalidUrl {
            url: url.to_string(),
        })?;
        retry_transient(&self.retry, url, || self.get_page(url)).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,text/x-component,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// Only errors reporting [`CrawlError::is_transient`] are retried. When every
/// retry fails the last error is wrapped in `RetriesExhausted`.
pub(crate) async fn retry_transient<T, F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> CrawlResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CrawlResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if policy.max_retries == 0 => return Err(e),
            Err(e) if attempt >= policy.max_retries => {
                return Err(CrawlError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt + 1,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    url = %url,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(&fast_policy(3), "u", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(CrawlError::Status { url: "u".into(), status: 503 })
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: CrawlResult<()> = retry_transient(&fast_policy(3), "u", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CrawlError::Status { url: "u".into(), status: 404 })
        })
        .await;
        assert!(matches!(result, Err(CrawlError::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let calls = AtomicU32::new(0);
        let result: CrawlResult<()> = retry_transient(&fast_policy(2), "u", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CrawlError::Timeout { url: "u".into() })
        })
        .await;
        assert!(matches!(result, Err(CrawlError::RetriesExhausted { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = HarvestConfig::new().with_base_url("not a url");
        assert!(matches!(HttpIngestor::new(&config), Err(CrawlError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let ingestor = HttpIngestor::new(&HarvestConfig::default()).unwrap();
        let result = ingestor.fetch_page("::nope::").await;
        assert!(matches!(result, Err(CrawlError::InvalidUrl { .. })));
    }
}
