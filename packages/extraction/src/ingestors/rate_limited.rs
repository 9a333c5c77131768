//! Rate-limited ingestor wrapper.
//!
//! Wraps any Ingestor with a governor quota, so pacing is a property of the
//! transport rather than sleeps scattered through the pipeline.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::CrawlResult;
use crate::traits::ingestor::{Ingestor, RawPage};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// An ingestor wrapper that enforces a request rate.
///
/// Searches and page fetches draw from the same quota.
pub struct RateLimitedIngestor<I: Ingestor> {
    inner: I,
    limiter: Arc<DefaultRateLimiter>,
}

impl<I: Ingestor> RateLimitedIngestor<I> {
    /// Wrap `ingestor` with an evenly spaced rate and no bursts.
    ///
    /// A rate of zero is treated as one request per second.
    pub fn new(ingestor: I, requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        Self::with_quota(ingestor, Quota::per_second(rate).allow_burst(nonzero!(1u32)))
    }

    /// Create with a custom quota.
    pub fn with_quota(ingestor: I, quota: Quota) -> Self {
        Self {
            inner: ingestor,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

#[async_trait]
impl<I: Ingestor> Ingestor for RateLimitedIngestor<I> {
    async fn search(&self, query: &str, limit: usize) -> CrawlResult<String> {
        self.wait_for_permit().await;
        self.inner.search(query, limit).await
    }

    async fn fetch_page(&self, url: &str) -> CrawlResult<RawPage> {
        self.wait_for_permit().await;
        self.inner.fetch_page(url).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
